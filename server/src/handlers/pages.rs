//! Server-rendered pages.
//!
//! The pages are deliberately plain: the login form posts JSON to
//! `/api/login`, the dashboard calls `/api/logout`. All interpolated text is
//! escaped with [`escape_html`].

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
};

use crate::app::AppState;
use crate::auth::SessionClaims;

/// Name shown on the dashboard when no session claims are available.
const GUEST_NAME: &str = "ゲスト";

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"ja\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape_html(title)
    ))
}

/// `GET /`
pub async fn home() -> Html<String> {
    layout(
        "ようこそ",
        r#"<main style="padding: 20px; text-align: center">
<h1>ようこそ</h1>
<p>このページはトップページです。</p>
<a href="/login"><button type="button" style="padding: 10px 20px; margin-top: 20px">ログイン画面へ</button></a>
</main>"#,
    )
}

/// `GET /login`
pub async fn login_page() -> Html<String> {
    layout(
        "ログイン",
        r#"<main style="max-width: 400px; margin: auto; padding: 20px">
<h1>ログイン</h1>
<form id="login-form">
<input type="email" name="email" placeholder="メールアドレス" required style="display: block; width: 100%; margin-bottom: 10px">
<input type="password" name="password" placeholder="パスワード" required style="display: block; width: 100%; margin-bottom: 10px">
<button type="submit" style="width: 100%">ログイン</button>
</form>
<p id="login-error" style="color: red" hidden></p>
<a href="/"><button type="button" style="width: 100%; margin-top: 10px">トップページに戻る</button></a>
</main>
<script>
document.getElementById('login-form').addEventListener('submit', async (e) => {
  e.preventDefault();
  const form = e.target;
  const error = document.getElementById('login-error');
  error.hidden = true;
  const res = await fetch('/api/login', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({ email: form.email.value, password: form.password.value }),
  });
  if (res.ok) {
    window.location.href = '/dashboard';
    return;
  }
  let message = 'ログインに失敗しました';
  try {
    const data = await res.json();
    if (data.message) message = data.message;
  } catch (_) {}
  error.textContent = message;
  error.hidden = false;
});
</script>"#,
    )
}

/// `GET /dashboard`
///
/// Greets the signed-in email. The guard puts the claims in the request
/// extensions; without them (a policy that leaves `/dashboard` public) the
/// page greets a guest.
pub async fn dashboard(
    State(state): State<AppState>,
    claims: Option<Extension<SessionClaims>>,
) -> Html<String> {
    let name = claims.map_or_else(|| GUEST_NAME.to_string(), |Extension(c)| c.email);

    let embed = state.dashboard_embed_url.as_deref().map_or_else(
        || "<p>ダッシュボードが設定されていません。</p>".to_string(),
        |url| {
            format!(
                "<iframe src=\"{}\" width=\"100%\" height=\"600\" style=\"border: none\"></iframe>",
                escape_html(url)
            )
        },
    );

    let body = format!(
        r#"<div>
<h1>ようこそ {} さん</h1>
<button type="button" id="logout">ログアウト</button>
<h1>ダッシュボード</h1>
{embed}
</div>
<script>
document.getElementById('logout').addEventListener('click', async () => {{
  await fetch('/api/logout', {{ method: 'POST' }});
  window.location.href = '/login';
}});
</script>"#,
        escape_html(&name)
    );
    layout("ダッシュボード", &body)
}

/// `GET /favicon.ico`
pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Fallback for unknown paths. Runs after the guard.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, layout("Not Found", "<h1>404 Not Found</h1>"))
}

/// Escape text for HTML element content and quoted attribute values.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
