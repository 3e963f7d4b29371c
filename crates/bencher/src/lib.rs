//! Shared fixtures for the sprig benchmarks.

/// A raw request fed to the decoder benchmarks.
#[derive(Debug, Copy, Clone)]
pub struct RequestCase {
    name: &'static str,
    content: &'static str,
}

impl RequestCase {
    pub const fn new(name: &'static str, content: &'static str) -> Self {
        Self { name, content }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn content(&self) -> &'static str {
        self.content
    }
}

pub static SMALL_REQUEST: RequestCase = RequestCase::new("small_header", "GET /hello HTTP/1.1\r\nHost: 127.0.0.1:9999\r\n\r\n");

pub static LARGE_REQUEST: RequestCase = RequestCase::new(
    "large_header",
    concat!(
        "POST /api/v1/users/42/books HTTP/1.1\r\n",
        "Host: 127.0.0.1:9999\r\n",
        "User-Agent: Mozilla/5.0 (X11; Linux x86_64; rv:131.0) Gecko/20100101 Firefox/131.0\r\n",
        "Accept: text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8\r\n",
        "Accept-Language: en-US,en;q=0.5\r\n",
        "Accept-Encoding: gzip, deflate, br, zstd\r\n",
        "Content-Type: application/x-www-form-urlencoded\r\n",
        "Cookie: session=4f1c9a7e2b; theme=dark; lang=en\r\n",
        "Cache-Control: no-cache\r\n",
        "Connection: keep-alive\r\n",
        "Content-Length: 27\r\n",
        "\r\n",
        "title=sprig&author=authors\n",
    ),
);

/// Patterns registered by the router benchmarks, one GitHub-like API shape.
pub static ROUTES: &[(&str, &str)] = &[
    ("GET", "/"),
    ("GET", "/users/:user"),
    ("GET", "/users/:user/repos"),
    ("GET", "/users/:user/repos/:repo"),
    ("GET", "/users/:user/repos/:repo/issues/:number"),
    ("POST", "/users/:user/repos"),
    ("DELETE", "/users/:user/repos/:repo"),
    ("GET", "/orgs/:org/members"),
    ("GET", "/static/*filepath"),
    ("GET", "/search/code"),
    ("GET", "/search/issues"),
    ("GET", "/rate_limit"),
];

/// Concrete paths looked up by the router benchmarks.
pub static LOOKUPS: &[(&str, &str)] = &[
    ("GET", "/"),
    ("GET", "/users/sprig/repos/router/issues/7"),
    ("POST", "/users/sprig/repos"),
    ("GET", "/static/css/site.css"),
    ("GET", "/search/issues"),
    ("GET", "/missing/route"),
];
