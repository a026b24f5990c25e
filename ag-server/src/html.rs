//! Small HTML page renderers (spec.md §4.6). Plain `format!` string
//! assembly over small fixed shapes, in the manner of `marker::feedback::
//! auto_feedback::AutoFeedback` rather than a general templating engine —
//! every shape here is fixed and never varies per call.

/// Inlined once per page (spec.md §4.6: "a small CSS block for OK/FAIL
/// glyphs, code blocks with line numbers, and syntax-highlight colors; the
/// CSS is inlined").
const REPORT_CSS: &str = "\
body { font-family: sans-serif; margin: 2rem; color: #222; }
.inline-test { border: 1px solid #ddd; border-radius: 4px; padding: 0.75rem; margin: 0.75rem 0; }
.inline-test.pass { border-left: 4px solid #2da44e; }
.inline-test.fail { border-left: 4px solid #cf222e; }
.inline-test h4 { margin: 0 0 0.5rem 0; }
pre.error { background: #fff0f0; color: #82071e; padding: 0.5rem; overflow-x: auto; }
pre { counter-reset: line; }
pre code, pre.highlight { display: block; }
.highlight { background: #fafafa; padding: 0.5rem; overflow-x: auto; }
details.log summary { cursor: pointer; color: #555; }
";

pub fn render_index() -> String {
    format!(
        "<!doctype html><html><head><title>Autograder</title><style>{REPORT_CSS}</style></head>\
         <body><h1>Submit a notebook</h1>\
         <form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\
         <input type=\"file\" name=\"notebook\" accept=\".ipynb\">\
         <button type=\"submit\">Upload</button></form></body></html>"
    )
}

pub fn render_upload_result(report_url: &str) -> String {
    format!(
        "<!doctype html><html><head><title>Submitted</title><style>{REPORT_CSS}</style></head>\
         <body><h1>Submission received</h1><p>Your report will appear at \
         <a href=\"{report_url}\">{report_url}</a>.</p></body></html>"
    )
}

/// Renders the final report: exercise `report` fragments concatenated in
/// sorted exercise-id order (spec.md §4.6 Report retrieval).
pub fn render_report_page(submission_id: &str, fragments: &[(String, String)]) -> String {
    let mut sorted = fragments.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let body: String = sorted
        .into_iter()
        .map(|(exercise_id, html)| format!("<section data-exercise=\"{exercise_id}\">{html}</section>"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<!doctype html><html><head><title>Report {submission_id}</title><style>{REPORT_CSS}</style></head>\
         <body><h1>Report for {submission_id}</h1>{body}</body></html>"
    )
}

/// The self-refreshing placeholder shown while a report is not yet written
/// (spec.md §4.6: "the first request records a timestamp ... subsequent
/// requests set the reload delay to the elapsed milliseconds").
pub fn render_polling_page(submission_id: &str, delay_ms: u64) -> String {
    format!(
        "<!doctype html><html><head><title>Grading…</title>\
         <meta http-equiv=\"refresh\" content=\"{seconds}\"></head>\
         <body><p>Grading submission {submission_id}, please wait…</p></body></html>",
        seconds = (delay_ms as f64 / 1000.0).max(0.1)
    )
}

/// Shown once polling has exceeded the 10s threshold (spec.md §4.6).
pub fn render_timeout_page(submission_id: &str) -> String {
    format!(
        "<!doctype html><html><head><title>Still grading…</title></head>\
         <body><p>Submission {submission_id} is taking longer than expected. \
         <a href=\"/report/{submission_id}\">Refresh manually</a>.</p></body></html>"
    )
}

pub fn render_login_required() -> String {
    "<!doctype html><html><body><p>Authentication required. \
     <a href=\"/login\">Log in</a> to continue.</p></body></html>"
        .to_string()
}

pub fn render_forbidden() -> String {
    "<!doctype html><html><body><p>Your account is not on the allow-list. \
     <a href=\"/logout\">Log out</a> and try a different account.</p></body></html>"
        .to_string()
}

/// A synthesized error report for a job that never reached the grading
/// engine (spec.md §7: "Parse errors ... surfaced to the client as an HTTP
/// 500 with a synthesized report containing an HTML error fragment"), in
/// the same `.inline-test.fail` shape as a graded exercise's own fragments.
pub fn render_error_fragment(message: &str) -> String {
    format!(
        "<!doctype html><html><head><title>Error</title><style>{REPORT_CSS}</style></head>\
         <body><div class=\"inline-test fail\"><h4>&#10007; Error</h4>\
         <pre class=\"error\">{}</pre></div></body></html>",
        html_escape::encode_text(message)
    )
}
