//! The single-page UI: a login form, then a two-pane layout with the
//! query library on the left and the question box on the right, plus
//! dashboard counters, revenue charts and a recent-questions history.

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Sales Assistant</title>
<style>
  :root { --bg: #f5f6f8; --panel: #ffffff; --accent: #2f6fed; --muted: #6b7280; }
  * { box-sizing: border-box; }
  body { margin: 0; font-family: system-ui, sans-serif; background: var(--bg); color: #111827; }
  header { background: var(--panel); border-bottom: 1px solid #e5e7eb; padding: 12px 24px;
           display: flex; justify-content: space-between; align-items: center; }
  header h1 { font-size: 18px; margin: 0; }
  main { display: grid; grid-template-columns: 380px 1fr; gap: 16px; padding: 16px 24px; }
  .panel { background: var(--panel); border: 1px solid #e5e7eb; border-radius: 8px; padding: 16px; }
  .hidden { display: none !important; }
  #login-box { max-width: 360px; margin: 80px auto; }
  input, select, textarea, button { font: inherit; }
  input[type=password], input[type=text], textarea {
    width: 100%; padding: 8px; border: 1px solid #d1d5db; border-radius: 6px; }
  button { background: var(--accent); color: #fff; border: 0; border-radius: 6px;
           padding: 8px 14px; cursor: pointer; }
  button.secondary { background: #e5e7eb; color: #111827; }
  table { border-collapse: collapse; width: 100%; margin-top: 12px; font-size: 14px; }
  th, td { border: 1px solid #e5e7eb; padding: 6px 8px; text-align: left; }
  th { background: #f9fafb; }
  .metrics { display: grid; grid-template-columns: repeat(4, 1fr); gap: 12px;
             padding: 16px 24px 0; }
  .metric { background: var(--panel); border: 1px solid #e5e7eb; border-radius: 8px; padding: 12px; }
  .metric .value { font-size: 22px; font-weight: 600; }
  .metric .label { color: var(--muted); font-size: 13px; }
  .charts { display: grid; grid-template-columns: 1fr 1fr; gap: 16px; padding: 16px 24px 0; }
  .bar-row { display: grid; grid-template-columns: 110px 1fr 70px; gap: 8px;
             align-items: center; font-size: 13px; margin: 4px 0; }
  .bar { background: var(--accent); height: 14px; border-radius: 3px; min-width: 2px; }
  .error { color: #b91c1c; margin-top: 8px; white-space: pre-wrap; }
  pre { background: #f3f4f6; padding: 10px; border-radius: 6px; overflow-x: auto; }
  .query-item { padding: 8px; border-radius: 6px; cursor: pointer; }
  .query-item:hover { background: #eef2ff; }
  .query-item .name { font-weight: 600; }
  .query-item .desc { color: var(--muted); font-size: 13px; }
  #explanation { background: #eef2ff; padding: 12px; border-radius: 6px; margin-top: 12px; }
  .history-item { padding: 6px 8px; border-radius: 6px; cursor: pointer; font-size: 14px; }
  .history-item:hover { background: #eef2ff; }
</style>
</head>
<body>
<div id="login-box" class="panel">
  <h2>Sales Assistant</h2>
  <p>Enter the access password to continue.</p>
  <input type="password" id="password" placeholder="Password">
  <p><button onclick="login()">Sign in</button></p>
  <div id="login-error" class="error"></div>
</div>

<div id="app" class="hidden">
<header>
  <h1>Sales Assistant</h1>
  <button class="secondary" onclick="logout()">Sign out</button>
</header>
<div class="metrics" id="metrics"></div>
<div class="charts">
  <div class="panel">
    <h3>Monthly revenue</h3>
    <div id="monthly-chart"></div>
  </div>
  <div class="panel">
    <h3>Top products</h3>
    <div id="products-chart"></div>
  </div>
</div>
<main>
  <div class="panel">
    <h3>Query library</h3>
    <div id="query-list"></div>
    <h3>Table preview</h3>
    <select id="preview-table">
      <option>region</option><option>product</option><option>customer</option>
      <option>orders</option><option>order_line</option>
    </select>
    <button onclick="preview()">Preview</button>
    <h3>Recent questions</h3>
    <div id="history"></div>
  </div>
  <div class="panel">
    <h3>Ask a question</h3>
    <textarea id="question" rows="3"
      placeholder="e.g. Which product category earned the most last year?"></textarea>
    <p><button onclick="ask()">Ask</button> <span id="busy" class="hidden">Thinking…</span></p>
    <div id="ask-error" class="error"></div>
    <div id="explanation" class="hidden"></div>
    <pre id="sql" class="hidden"></pre>
    <div id="results"></div>
  </div>
</main>
</div>

<script>
let token = sessionStorage.getItem('token');
const HISTORY_LIMIT = 6;
let history = [];

function escapeHtml(value) {
  return String(value)
    .replaceAll('&', '&amp;')
    .replaceAll('<', '&lt;')
    .replaceAll('>', '&gt;')
    .replaceAll('"', '&quot;')
    .replaceAll("'", '&#39;');
}

async function api(method, path, body) {
  const headers = { 'Content-Type': 'application/json' };
  if (token) headers['Authorization'] = 'Bearer ' + token;
  const resp = await fetch(path, {
    method, headers, body: body ? JSON.stringify(body) : undefined,
  });
  const data = await resp.json().catch(() => ({}));
  if (resp.status === 401) { showLogin(); throw new Error('Session expired'); }
  if (!resp.ok) {
    let msg = data.error || resp.statusText;
    if (data.sql) msg += '\n\nSQL:\n' + data.sql;
    throw new Error(msg);
  }
  return data;
}

function showLogin() {
  token = null;
  sessionStorage.removeItem('token');
  document.getElementById('app').classList.add('hidden');
  document.getElementById('login-box').classList.remove('hidden');
}

async function login() {
  const password = document.getElementById('password').value;
  try {
    const data = await api('POST', '/api/login', { password });
    token = data.token;
    sessionStorage.setItem('token', token);
    document.getElementById('login-box').classList.add('hidden');
    document.getElementById('app').classList.remove('hidden');
    await loadDashboard();
  } catch (e) {
    document.getElementById('login-error').textContent = e.message;
  }
}

async function logout() {
  try { await api('POST', '/api/logout'); } catch (e) {}
  showLogin();
}

async function loadDashboard() {
  await Promise.all([loadMetrics(), loadQueries(), loadCharts()]);
}

async function loadMetrics() {
  const o = await api('GET', '/api/overview');
  document.getElementById('metrics').innerHTML = [
    metric(o.customers, 'Customers'),
    metric(o.order_lines, 'Order lines'),
    metric('$' + o.total_revenue.toFixed(2), 'Total revenue'),
    metric(o.top_region || '—', 'Top region'),
  ].join('');
}

function metric(value, label) {
  return `<div class="metric"><div class="value">${escapeHtml(value)}</div>` +
         `<div class="label">${escapeHtml(label)}</div></div>`;
}

async function loadCharts() {
  // Monthly revenue (ex10) and product totals within category (ex6);
  // the top-10 products chart is cut client-side
  const [monthly, byProduct] = await Promise.all([
    api('POST', '/api/queries/ex10', { params: [] }),
    api('POST', '/api/queries/ex6', { params: [] }),
  ]);
  renderBars('monthly-chart', monthly.rows.map(r => [r[0], r[1]]));

  const products = byProduct.rows
    .map(r => [r[1], r[2]])
    .sort((a, b) => b[1] - a[1])
    .slice(0, 10);
  renderBars('products-chart', products);
}

function renderBars(elementId, pairs) {
  const el = document.getElementById(elementId);
  if (!pairs.length) { el.innerHTML = '<p>No data yet.</p>'; return; }
  const max = Math.max(...pairs.map(p => p[1]));
  el.innerHTML = pairs.map(([label, value]) =>
    `<div class="bar-row"><span>${escapeHtml(label)}</span>` +
    `<div class="bar" style="width:${max > 0 ? (100 * value / max) : 0}%"></div>` +
    `<span>$${Number(value).toFixed(2)}</span></div>`
  ).join('');
}

async function loadQueries() {
  const defs = await api('GET', '/api/queries');
  const list = document.getElementById('query-list');
  list.innerHTML = '';
  for (const def of defs) {
    const item = document.createElement('div');
    item.className = 'query-item';
    item.innerHTML = `<div class="name">${escapeHtml(def.name)}</div>` +
                     `<div class="desc">${escapeHtml(def.description)}</div>`;
    item.onclick = () => runQuery(def);
    list.appendChild(item);
  }
}

async function runQuery(def) {
  const params = [];
  for (const p of def.params) {
    const v = prompt(p.description);
    if (v === null) return;
    params.push(v);
  }
  try {
    const out = await api('POST', '/api/queries/' + def.name, { params });
    showResult(out, null, null);
  } catch (e) {
    showError(e.message);
  }
}

async function preview() {
  const table = document.getElementById('preview-table').value;
  try {
    const out = await api('GET', '/api/preview/' + table);
    showResult(out, null, null);
  } catch (e) {
    showError(e.message);
  }
}

async function ask() {
  const question = document.getElementById('question').value;
  const busy = document.getElementById('busy');
  busy.classList.remove('hidden');
  document.getElementById('ask-error').textContent = '';
  try {
    const answer = await api('POST', '/api/ask', { question });
    rememberQuestion(question, answer);
    showResult(answer, answer.sql, answer.explanation);
  } catch (e) {
    showError(e.message);
  } finally {
    busy.classList.add('hidden');
  }
}

function rememberQuestion(question, answer) {
  history.unshift({ question, answer });
  history = history.slice(0, HISTORY_LIMIT);
  renderHistory();
}

function renderHistory() {
  const el = document.getElementById('history');
  if (!history.length) { el.innerHTML = '<p>Nothing asked yet.</p>'; return; }
  el.innerHTML = '';
  history.forEach((entry, idx) => {
    const item = document.createElement('div');
    item.className = 'history-item';
    item.textContent = entry.question;
    item.onclick = () => {
      const a = history[idx].answer;
      document.getElementById('question').value = history[idx].question;
      showResult(a, a.sql, a.explanation);
    };
    el.appendChild(item);
  });
}

function showError(message) {
  document.getElementById('ask-error').textContent = message;
}

function showResult(out, sql, explanation) {
  document.getElementById('ask-error').textContent = '';

  const exp = document.getElementById('explanation');
  exp.classList.toggle('hidden', !explanation);
  exp.textContent = explanation || '';

  const sqlBox = document.getElementById('sql');
  sqlBox.classList.toggle('hidden', !sql);
  sqlBox.textContent = sql || '';

  const results = document.getElementById('results');
  if (!out.rows || out.rows.length === 0) {
    results.innerHTML = '<p>No rows.</p>';
    return;
  }
  let html = '<table><tr>';
  for (const c of out.columns) html += `<th>${escapeHtml(c)}</th>`;
  html += '</tr>';
  for (const row of out.rows) {
    html += '<tr>' +
      row.map(v => `<td>${v === null ? '' : escapeHtml(v)}</td>`).join('') +
      '</tr>';
  }
  results.innerHTML = html + '</table>';
}

if (token) {
  document.getElementById('login-box').classList.add('hidden');
  document.getElementById('app').classList.remove('hidden');
  loadDashboard().catch(() => showLogin());
}
renderHistory();
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_escapes_database_strings() {
        // Everything interpolated into innerHTML goes through the escaper
        assert!(INDEX_HTML.contains("function escapeHtml"));
        assert!(INDEX_HTML.contains("<td>${v === null ? '' : escapeHtml(v)}</td>"));
        assert!(INDEX_HTML.contains("<th>${escapeHtml(c)}</th>"));
        assert!(!INDEX_HTML.contains("${def.description}</div>"));
    }

    #[test]
    fn test_page_keeps_a_bounded_question_history() {
        assert!(INDEX_HTML.contains("const HISTORY_LIMIT = 6"));
        assert!(INDEX_HTML.contains("history.slice(0, HISTORY_LIMIT)"));
        assert!(INDEX_HTML.contains("Recent questions"));
    }

    #[test]
    fn test_page_has_dashboard_charts() {
        assert!(INDEX_HTML.contains("monthly-chart"));
        assert!(INDEX_HTML.contains("products-chart"));
        assert!(INDEX_HTML.contains("/api/queries/ex10"));
        assert!(INDEX_HTML.contains("/api/queries/ex6"));
    }
}
