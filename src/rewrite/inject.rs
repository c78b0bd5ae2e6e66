//! Mirror asset injection before `</head>`.

use std::borrow::Cow;

use crate::rewrite::rules::find;

/// Literal insertion point. Only the first occurrence is used.
pub const HEAD_CLOSE: &[u8] = b"</head>";

/// The fixed three-tag block placed immediately before `</head>`.
pub fn head_block(origin_base: &str) -> Vec<u8> {
    format!(
        "\n<link rel=\"stylesheet\" href=\"{origin_base}/w/load.php?debug=false&lang=en&modules=site.styles&only=styles&skin=vector\">\
         \n<link rel=\"stylesheet\" href=\"/static/custom.css\">\
         \n<script src=\"/static/custom.js\"></script>\n"
    )
    .into_bytes()
}

/// Insert `block` before the first `</head>`; documents without one pass through.
pub fn inject_before_head_close<'a>(document: Cow<'a, [u8]>, block: &[u8]) -> Cow<'a, [u8]> {
    let Some(at) = find(&document, HEAD_CLOSE) else {
        return document;
    };
    let mut out = Vec::with_capacity(document.len() + block.len());
    out.extend_from_slice(&document[..at]);
    out.extend_from_slice(block);
    out.extend_from_slice(&document[at..]);
    Cow::Owned(out)
}
