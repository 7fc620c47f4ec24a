use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::state::AppState;

/// Axum handler: GET /
pub async fn handler(Extension(state): Extension<AppState>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        render_index(&state.public_couchdb, state.debug),
    )
        .into_response()
}

pub fn render_index(public_couchdb: &str, debug: bool) -> String {
    INDEX_HTML
        .replace("{{COUCHDB}}", &escape_html(public_couchdb))
        .replace("{{DEBUG}}", if debug { "true" } else { "false" })
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Znode Dashboard</title>
    <style>
      :root {
        --bg: #f4f6f8;
        --ink: #1d2430;
        --muted: #667085;
        --accent: #23b35f;
        --card: #ffffff;
        --line: #e4e7ec;
      }

      body {
        margin: 0;
        font-family: "Inter", "Avenir Next", "Segoe UI", sans-serif;
        color: var(--ink);
        background: var(--bg);
      }

      header {
        padding: 24px 32px;
        background: var(--ink);
        color: #fff;
        display: flex;
        justify-content: space-between;
        align-items: baseline;
      }

      main {
        max-width: 1100px;
        margin: 0 auto;
        padding: 24px 32px;
      }

      .cards {
        display: grid;
        grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
        gap: 16px;
        margin-bottom: 24px;
      }

      .card {
        background: var(--card);
        border: 1px solid var(--line);
        border-radius: 10px;
        padding: 16px;
      }

      .label {
        color: var(--muted);
        font-size: 13px;
        text-transform: uppercase;
        letter-spacing: 0.04em;
      }

      .value {
        font-size: 26px;
        font-weight: 600;
        margin-top: 6px;
      }

      table {
        width: 100%;
        border-collapse: collapse;
        background: var(--card);
        border: 1px solid var(--line);
      }

      th, td {
        text-align: left;
        padding: 8px 12px;
        border-bottom: 1px solid var(--line);
        font-size: 14px;
      }

      form {
        display: flex;
        gap: 8px;
        margin: 24px 0 12px;
      }

      input {
        flex: 1;
        padding: 8px 10px;
        border: 1px solid var(--line);
        border-radius: 6px;
      }

      button {
        background: var(--accent);
        color: #fff;
        border: 0;
        border-radius: 6px;
        padding: 8px 16px;
      }

      pre {
        background: var(--card);
        border: 1px solid var(--line);
        padding: 12px;
        overflow-x: auto;
      }

      .debug {
        color: #f5a524;
        font-size: 12px;
      }
    </style>
  </head>
  <body data-couchdb="{{COUCHDB}}" data-debug="{{DEBUG}}">
    <header>
      <h1>Znode Dashboard</h1>
      <span id="debug-flag" class="debug"></span>
    </header>
    <main>
      <section class="cards">
        <div class="card"><div class="label">XZC / USD</div><div class="value" id="price">-</div></div>
        <div class="card"><div class="label">Znodes</div><div class="value" id="count">-</div></div>
        <div class="card"><div class="label">Block height</div><div class="value" id="height">-</div></div>
      </section>

      <h2>Upcoming payments</h2>
      <table>
        <thead>
          <tr><th>Block</th><th>Payee</th><th>Queue position</th><th>Last paid</th></tr>
        </thead>
        <tbody id="winners"></tbody>
      </table>

      <form id="lookup">
        <input id="address" placeholder="Payee, owner, voting or collateral address">
        <button type="submit">Find znode</button>
      </form>
      <pre id="lookup-result"></pre>
    </main>
    <script>
      const body = document.body;
      if (body.dataset.debug === "true") {
        document.getElementById("debug-flag").textContent = "debug";
      }

      async function getJson(url) {
        const res = await fetch(url);
        if (!res.ok) throw new Error(url + " " + res.status);
        return res.json();
      }

      async function refresh() {
        try {
          const price = await (await fetch("/api/xzc_price")).text();
          document.getElementById("price").textContent = "$" + Number(price).toFixed(2);
        } catch (e) {}
        try {
          const count = await getJson("/api/znode/count");
          document.getElementById("count").textContent =
            typeof count === "object" ? (count.enabled ?? count.total) : count;
        } catch (e) {}
        try {
          const tpl = await getJson("/api/getblocktemplate");
          document.getElementById("height").textContent = tpl.height;
        } catch (e) {}
        try {
          const winners = await getJson("/api/evoznode/winners");
          const tbody = document.getElementById("winners");
          tbody.replaceChildren(...winners.map((w) => {
            const tr = document.createElement("tr");
            for (const cell of [w.nextPaidBlock, w.payee, w.queuePos, w.lastpaidblock]) {
              const td = document.createElement("td");
              td.textContent = cell;
              tr.appendChild(td);
            }
            return tr;
          }));
        } catch (e) {}
      }

      document.getElementById("lookup").addEventListener("submit", async (ev) => {
        ev.preventDefault();
        const address = document.getElementById("address").value.trim();
        const out = document.getElementById("lookup-result");
        try {
          const znode = await getJson("/api2/znode/" + encodeURIComponent(address));
          out.textContent = JSON.stringify(znode, null, 2);
        } catch (e) {
          out.textContent = "No znode found for " + address;
        }
      });

      refresh();
      setInterval(refresh, 60000);
    </script>
  </body>
</html>
"#;
