use http::StatusCode;
use sprig_web::{Context, Engine};
use tracing::{Level, error};
use tracing_subscriber::FmtSubscriber;

// curl -v http://127.0.0.1:9999/hello/sprig
#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut engine = Engine::default_engine();
    engine.get("/", |ctx: &mut Context| ctx.html(StatusCode::OK, "<h1>Hello Sprig</h1>"));
    engine.get("/hello/:name", |ctx: &mut Context| {
        let greeting = format!("hello {}, you're at {}\n", ctx.param("name"), ctx.path());
        ctx.string(StatusCode::OK, greeting);
    });
    engine.get("/assets/*filepath", |ctx: &mut Context| {
        let filepath = ctx.param("filepath").to_owned();
        ctx.json(StatusCode::OK, &serde_json::json!({ "filepath": filepath }));
    });

    if let Err(e) = engine.run("127.0.0.1:9999").await {
        error!(cause = %e, "server stopped");
    }
}
