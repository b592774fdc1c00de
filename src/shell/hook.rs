//! Link interception installed into every loaded document.
//!
//! `window.open` and clicks on `target="_blank"` anchors are rerouted to the
//! `open_external` command, so external pages open in the system browser
//! instead of replacing the embedded app.

/// Global flag set by the script once installed in a document.
pub const INSTALLED_FLAG: &str = "__agentPlaygroundLinkHook";

/// IPC command the script calls.
pub const BRIDGE_COMMAND: &str = "open_external";

/// Script evaluated on each finished page load.
pub fn link_intercept_script() -> String {
    format!(
        r#"(function () {{
  if (window.{flag}) {{
    return;
  }}
  window.{flag} = true;

  function invokeBridge(url) {{
    var tauri = window.__TAURI__;
    var invoke = (tauri && tauri.core && tauri.core.invoke) ||
      (window.__TAURI_INTERNALS__ && window.__TAURI_INTERNALS__.invoke);
    if (!invoke) {{
      console.log('desktop bridge not available');
      return;
    }}
    Promise.resolve(invoke('{command}', {{ url: String(url) }})).catch(function (err) {{
      console.warn('open_external failed:', err);
    }});
  }}

  window.open = function (url) {{
    if (url === undefined || url === null || String(url) === '') {{
      return null;
    }}
    var target = String(url);
    try {{
      target = new URL(target, window.location.href).href;
    }} catch (err) {{
      // Let the host reject and log it.
    }}
    invokeBridge(target);
    return null;
  }};

  document.addEventListener('click', function (event) {{
    var el = event.target;
    while (el && el.tagName !== 'A') {{
      el = el.parentElement;
    }}
    if (!el || !el.href || (el.target || '').toLowerCase() !== '_blank') {{
      return;
    }}
    event.preventDefault();
    invokeBridge(el.href);
  }}, true);
}})();"#,
        flag = INSTALLED_FLAG,
        command = BRIDGE_COMMAND,
    )
}
