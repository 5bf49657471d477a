use crate::server::ChainInfo;

/// Values shown on `/debug`.
pub struct DebugView<'a> {
    pub server_url: &'a str,
    pub rpc_url: Option<&'a str>,
    pub block_number: u64,
    pub env: &'a str,
    pub chains: &'a [ChainInfo],
}

fn escape(text: &str) -> String {
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

pub fn render(view: &DebugView<'_>) -> String {
    let rpc = view
        .rpc_url
        .map(escape)
        .unwrap_or_else(|| "not configured".to_string());

    let chains = if view.chains.is_empty() {
        String::from("<li class=\"muted\">none</li>")
    } else {
        view.chains
            .iter()
            .map(|c| {
                format!(
                    "<li>{} <span class=\"muted\">(chain {})</span> <code>{}</code></li>",
                    escape(&c.name),
                    c.chain_id,
                    escape(&c.rpc_url)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>VX SDK - Debug</title>
    <style>
        body {{ font-family: system-ui, sans-serif; background: #f8fafc; color: #0f172a; margin: 0; }}
        header {{ background: #0f172a; color: #fff; padding: 1rem 2rem; display: flex; gap: 1rem; }}
        header nav {{ margin-left: auto; }}
        header a {{ color: #fff; }}
        main {{ max-width: 56rem; margin: 0 auto; padding: 1.5rem 2rem; }}
        .card {{ background: #fff; border: 1px solid #e2e8f0; border-radius: 0.75rem; padding: 1rem; margin-bottom: 1rem; }}
        .block {{ font-size: 1.5rem; font-weight: 600; }}
        .muted {{ color: #64748b; font-size: 0.875rem; }}
    </style>
</head>
<body>
    <header>
        <h1>VX SDK Debug</h1>
        <nav><a href="/api">/api</a> &middot; <a href="/api/block">/api/block</a></nav>
    </header>
    <main>
        <section class="card">
            <h2>Server</h2>
            <p class="muted">{server_url}</p>
            <p class="muted">Environment: {env}</p>
            <p class="muted">Current RPC URL: <code>{rpc}</code></p>
            <div class="block" id="block-number">{block}</div>
            <div class="muted">latest block</div>
        </section>
        <section class="card">
            <h3>Endpoints</h3>
            <ul>
                <li><a href="/api">GET /api</a></li>
                <li><a href="/api/block">GET /api/block</a></li>
                <li>POST /api/pay</li>
            </ul>
        </section>
        <section class="card">
            <h3>Chains</h3>
            <ul>
{chains}
            </ul>
        </section>
    </main>
</body>
</html>
"#,
        server_url = escape(view.server_url),
        env = escape(view.env),
        rpc = rpc,
        block = view.block_number,
        chains = chains,
    )
}
