use std::time::Instant;

use http::StatusCode;
use serde::Serialize;
use sprig_web::{Context, Engine};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Serialize)]
struct Login {
    username: String,
    password_len: usize,
}

/// Times only the requests under `/v2`.
fn v2_timer(ctx: &mut Context) {
    let start = Instant::now();
    ctx.next();
    info!(status = ctx.status_code().as_u16(), elapsed = ?start.elapsed(), path = ctx.path(), "v2 request");
}

fn require_token(ctx: &mut Context) {
    if ctx.query("token").is_none() {
        ctx.fail(StatusCode::UNAUTHORIZED, "missing token");
        return;
    }
    ctx.next();
}

// curl http://127.0.0.1:9999/v1/hello?name=sprig
// curl -d 'username=sprig&password=secret' http://127.0.0.1:9999/v1/login
// curl http://127.0.0.1:9999/v2/hello/sprig
// curl http://127.0.0.1:9999/v2/admin/panic?token=t
#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut engine = Engine::default_engine();
    engine.get("/index", |ctx: &mut Context| ctx.html(StatusCode::OK, "<h1>Index Page</h1>"));

    {
        let mut v1 = engine.group("/v1");
        v1.get("/hello", |ctx: &mut Context| {
            let name = ctx.query("name").unwrap_or_default();
            let greeting = format!("hello {name}, you're at {}\n", ctx.path());
            ctx.string(StatusCode::OK, greeting);
        });
        v1.post("/login", |ctx: &mut Context| {
            let login = Login {
                username: ctx.post_form("username").unwrap_or_default(),
                password_len: ctx.post_form("password").map_or(0, |password| password.len()),
            };
            ctx.json(StatusCode::OK, &login);
        });
    }

    {
        let mut v2 = engine.group("/v2");
        v2.use_middleware(v2_timer);
        v2.get("/hello/:name", |ctx: &mut Context| {
            let greeting = format!("hello {}, you're at {}\n", ctx.param("name"), ctx.path());
            ctx.string(StatusCode::OK, greeting);
        });

        let mut admin = v2.group("/admin");
        admin.use_middleware(require_token);
        admin.get("/panic", |_ctx: &mut Context| panic!("recovered by the default engine"));
    }

    if let Err(e) = engine.run("127.0.0.1:9999").await {
        error!(cause = %e, "server stopped");
    }
}
