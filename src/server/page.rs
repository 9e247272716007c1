//! The single-page chat UI

const TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Setu AI - Funding Analyst</title>
<style>
  body { margin: 0; font-family: system-ui, sans-serif; display: flex; min-height: 100vh; color: #1f2328; }
  aside { width: 300px; padding: 1.2rem; background: #f3f4f6; box-sizing: border-box; }
  main { flex: 1; padding: 1.2rem 2rem; display: flex; flex-direction: column; max-width: 900px; }
  .notice { padding: .7rem 1rem; border-radius: 6px; margin: .6rem 0; }
  .warn { background: #fff4ce; } .info { background: #e0ecff; } .ok { background: #dcf5e3; } .err { background: #fde2e1; }
  #log { flex: 1; overflow-y: auto; }
  .msg { padding: .6rem .9rem; margin: .4rem 0; border-radius: 8px; white-space: pre-wrap; }
  .user { background: #eef2ff; } .assistant { background: #f6f8fa; }
  form.chat { display: flex; gap: .5rem; margin-top: 1rem; }
  form.chat input { flex: 1; padding: .6rem; }
  input[type=password] { width: 100%; box-sizing: border-box; padding: .4rem; }
  button { padding: .5rem .9rem; cursor: pointer; }
</style>
</head>
<body>
<aside>
  <h2>⚙️ Settings</h2>
  <div id="key-status"></div>
  <div id="key-form">
    <label for="api-key">Enter Groq API Key (gsk_...)</label>
    <input id="api-key" type="password" autocomplete="off">
  </div>
  <hr>
  <h3>📂 Analyze Your Doc</h3>
  <div class="notice info">ℹ️ Uploaded files are temporary and deleted on refresh.</div>
  <label for="file">Upload Pitch Deck / Report</label>
  <input id="file" type="file" accept="{{accept}}">
  <div id="upload-status"></div>
  <button id="process" hidden>🔄 Process &amp; Analyze Now</button>
</aside>
<main>
  <h1>{{title}}</h1>
  <p>{{tagline}}</p>
  <div id="notice"></div>
  <div id="log"></div>
  <form class="chat" id="chat-form">
    <input id="prompt" placeholder="Ask: 'Analyze my uploaded pitch deck'" autocomplete="off">
    <button type="submit">Send</button>
  </form>
</main>
<script>
let session = null;

function el(tag, cls, text) {
  const node = document.createElement(tag);
  if (cls) node.className = cls;
  if (text !== undefined) node.textContent = text;
  return node;
}

async function api(path, options) {
  const res = await fetch(path, options);
  const body = await res.json();
  if (!res.ok) throw new Error(body.error || res.statusText);
  return body;
}

function draw(view) {
  session = view;
  const keyStatus = document.getElementById('key-status');
  keyStatus.replaceChildren();
  if (view.key_loaded) {
    keyStatus.append(el('div', 'notice ok', '✅ API Key loaded'));
    document.getElementById('key-form').hidden = true;
  }
  const notice = document.getElementById('notice');
  notice.replaceChildren();
  if (view.notice) {
    const cls = view.readiness.state === 'missing_credential' ? 'warn'
      : view.readiness.state === 'empty_corpus' ? 'info' : 'err';
    notice.append(el('div', 'notice ' + cls, view.notice));
  }
  const log = document.getElementById('log');
  log.replaceChildren(...view.transcript.map(m => el('div', 'msg ' + m.role, m.content)));
  log.scrollTop = log.scrollHeight;
  document.getElementById('chat-form').hidden = view.readiness.state !== 'ready';
}

async function start() {
  draw(await api('/api/sessions', { method: 'POST' }));
}

document.getElementById('api-key').addEventListener('change', async (e) => {
  try {
    draw(await api(`/api/sessions/${session.id}/key`, {
      method: 'POST',
      headers: { 'content-type': 'application/json' },
      body: JSON.stringify({ api_key: e.target.value }),
    }));
  } catch (err) {
    document.getElementById('key-status').replaceChildren(el('div', 'notice err', err.message));
  }
});

document.getElementById('file').addEventListener('change', async (e) => {
  const file = e.target.files[0];
  if (!file) return;
  const status = document.getElementById('upload-status');
  const form = new FormData();
  form.append('file', file);
  try {
    const saved = await api(`/api/sessions/${session.id}/uploads`, { method: 'POST', body: form });
    status.replaceChildren(el('div', 'notice ok', '✅ ' + saved.message));
    document.getElementById('process').hidden = false;
  } catch (err) {
    status.replaceChildren(el('div', 'notice err', err.message));
  }
});

document.getElementById('process').addEventListener('click', async () => {
  const notice = document.getElementById('notice');
  notice.replaceChildren(el('div', 'notice info', '🧠 Reading Knowledge Base...'));
  try {
    draw(await api(`/api/sessions/${session.id}/process`, { method: 'POST' }));
  } catch (err) {
    notice.replaceChildren(el('div', 'notice err', err.message));
  }
});

document.getElementById('chat-form').addEventListener('submit', async (e) => {
  e.preventDefault();
  const input = document.getElementById('prompt');
  const message = input.value.trim();
  if (!message) return;
  input.value = '';
  const log = document.getElementById('log');
  log.append(el('div', 'msg user', message));
  const thinking = el('div', 'msg assistant', 'Thinking...');
  log.append(thinking);
  try {
    const turn = await api(`/api/sessions/${session.id}/messages`, {
      method: 'POST',
      headers: { 'content-type': 'application/json' },
      body: JSON.stringify({ message }),
    });
    if (turn.outcome === 'failed') {
      thinking.replaceWith(el('div', 'notice err', turn.error));
      return;
    }
  } catch (err) {
    thinking.replaceWith(el('div', 'notice err', 'Error: ' + err.message));
    return;
  }
  draw(await api(`/api/sessions/${session.id}`));
});

start().catch(err => {
  document.getElementById('notice').replaceChildren(el('div', 'notice err', err.message));
});
</script>
</body>
</html>
"#;

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the page with the configured header and accepted upload types
pub fn render_page(title: &str, tagline: &str, extensions: &[String]) -> String {
    let accept = extensions
        .iter()
        .map(|e| format!(".{}", e))
        .collect::<Vec<_>>()
        .join(",");
    TEMPLATE
        .replace("{{title}}", &escape_html(title))
        .replace("{{tagline}}", &escape_html(tagline))
        .replace("{{accept}}", &escape_html(&accept))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_page() {
        let html = render_page("PolyVest <AI>", "Ask away", &["pdf".into(), "txt".into(), "csv".into()]);
        assert!(html.contains("<h1>PolyVest &lt;AI&gt;</h1>"));
        assert!(html.contains(r#"accept=".pdf,.txt,.csv""#));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_key_and_process_failures_are_shown() {
        let html = render_page("Setu", "", &[]);
        let key_handler = html
            .split("getElementById('api-key').addEventListener")
            .nth(1)
            .unwrap();
        let key_handler = key_handler.split("addEventListener").next().unwrap();
        assert!(key_handler.contains("catch (err)"));
        assert!(key_handler.contains("getElementById('key-status').replaceChildren(el('div', 'notice err', err.message))"));

        let process_handler = html
            .split("getElementById('process').addEventListener")
            .nth(1)
            .unwrap();
        let process_handler = process_handler.split("addEventListener").next().unwrap();
        assert!(process_handler.contains("catch (err)"));
    }
}
