//! Server-rendered HTML.

use crate::storage::TableFile;

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
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

fn table_links(tables: &[TableFile]) -> String {
    tables
        .iter()
        .map(|t| {
            format!(
                "<li><a href=\"/csvview/{}\" target=\"_blank\">{}</a> <a href=\"/csvraw/{}\">raw</a></li>",
                urlencoding::encode(&t.file),
                escape_html(&t.table),
                urlencoding::encode(&t.file),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

const INDEX_SCRIPT: &str = r#"
async function post(url, body) {
  const res = await fetch(url, { method: "POST", body });
  return res.json();
}
async function runSql(source) {
  const fd = new FormData();
  fd.append("raw", document.getElementById(source).value);
  const data = await post("/run", fd);
  if (data.sql !== undefined) {
    document.getElementById("sql").value = data.sql;
    document.getElementById("output").innerText = data.output;
  } else {
    document.getElementById("output").innerText = "ERROR:\n" + data.message;
  }
  refreshTables();
}
async function uploadFiles() {
  const fd = new FormData();
  for (const f of document.getElementById("files").files) fd.append("files", f);
  await post("/upload", fd);
  refreshTables();
}
async function resetAll() {
  if (!confirm("Delete ALL CSV files?")) return;
  await post("/reset");
  window.location.reload();
}
async function refreshTables() {
  const res = await fetch("/tables");
  if (!res.ok) return;
  const ul = document.getElementById("tables");
  ul.innerHTML = "";
  for (const item of await res.json()) {
    const li = document.createElement("li");
    const a = document.createElement("a");
    a.href = "/csvview/" + encodeURIComponent(item.file);
    a.target = "_blank";
    a.textContent = item.table;
    li.appendChild(a);
    ul.appendChild(li);
  }
}
"#;

/// Landing page: table list, upload form, SQL forms, output pane.
pub fn index_page(tables: &[TableFile]) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>CSV database</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
textarea {{ width: 100%; font-family: monospace; }}
pre {{ background: #f4f4f4; padding: 1em; overflow-x: auto; }}
</style>
</head>
<body>
<h1>CSV database</h1>
<h2>Tables</h2>
<ul id="tables">
{links}
</ul>
<input type="file" id="files" multiple accept=".csv">
<button onclick="uploadFiles()">Upload</button>
<button onclick="resetAll()">Reset</button>
<h2>Command</h2>
<p>Plain SQL or <code>{{"command": "..."}}</code></p>
<textarea id="raw" rows="6"></textarea>
<button onclick="runSql('raw')">Run</button>
<h2>Decoded SQL</h2>
<textarea id="sql" rows="8"></textarea>
<button onclick="runSql('sql')">Re-run</button>
<h2>Output</h2>
<pre id="output"></pre>
<script>{script}</script>
</body>
</html>
"#,
        links = table_links(tables),
        script = INDEX_SCRIPT,
    )
}

/// CSV file rendered as an HTML table; the first record is the header.
pub fn csv_page(file: &str, records: &[Vec<String>]) -> String {
    let mut rows = records.iter();
    let header = rows
        .next()
        .map(|cells| table_row("th", cells))
        .unwrap_or_default();
    let body = rows
        .map(|cells| table_row("td", cells))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
table {{ border-collapse: collapse; }}
th, td {{ border: 1px solid #ccc; padding: 4px 8px; }}
th {{ background: #eee; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p><a href="/csvraw/{raw}">Download</a></p>
<table>
<thead>
{header}
</thead>
<tbody>
{body}
</tbody>
</table>
</body>
</html>
"#,
        title = escape_html(file),
        raw = urlencoding::encode(file),
    )
}

fn table_row(tag: &str, cells: &[String]) -> String {
    let cells: String = cells
        .iter()
        .map(|c| format!("<{tag}>{}</{tag}>", escape_html(c)))
        .collect();
    format!("<tr>{cells}</tr>")
}
