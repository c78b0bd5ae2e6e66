//! Ordered link rewrite rules.
//!
//! Each rule is a byte pattern plus a shared classifier. A rule scans the
//! whole buffer and replaces every match; the classifier decides what each
//! matched reference becomes.
//!
//! Classification checks, in priority order:
//! 1. references naming a host (`//` present): an origin or mirror host in
//!    an `href` is swapped onto the mirror; `src`, `url(` and `@import`
//!    references are scheme-upgraded only
//! 2. root-relative `href="/wiki/…"` → mirror, `href="/w/…"` → origin
//! 3. root-relative `src="/…"` → origin
//! 4. anything else is returned unchanged

use std::borrow::Cow;

use regex::bytes::{Captures, Regex};

/// Which secure base a root-relative reference is re-anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Mirror,
    Origin,
}

/// What a single matched reference turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Replace scheme and host with the mirror base, keep the path.
    DomainSwap,
    /// Replace the leading `//` with `https://`, keep the host.
    ProtocolUpgrade,
    /// Prefix a root-relative path with a secure base.
    PathRebase(Target),
    Noop,
}

/// Origin and mirror endpoints the rules rewrite between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// e.g. `https://wikipedia.org`
    pub origin_base: String,
    /// Host (and port, if any) of `origin_base`.
    pub origin_host: String,
    /// e.g. `https://m-wikipedia.org`
    pub mirror_base: String,
    /// Host (and port, if any) of `mirror_base`.
    pub mirror_host: String,
}

impl Endpoints {
    fn base(&self, target: Target) -> &str {
        match target {
            Target::Mirror => &self.mirror_base,
            Target::Origin => &self.origin_base,
        }
    }

    /// The origin itself, any subdomain of it, or the mirror host. An explicit
    /// port on the link is ignored when the exact authority does not match.
    ///
    /// Accepting the mirror host makes already-rewritten links a fixed point.
    fn names_origin(&self, authority: &[u8]) -> bool {
        self.names_host(authority) || strip_port(authority).is_some_and(|host| self.names_host(host))
    }

    fn names_host(&self, host: &[u8]) -> bool {
        let origin = self.origin_host.as_bytes();
        if host == origin || host == self.mirror_host.as_bytes() {
            return true;
        }
        host.len() > origin.len()
            && host.ends_with(origin)
            && host[host.len() - origin.len() - 1] == b'.'
    }
}

/// One pattern in the fixed rewrite sequence.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    name: &'static str,
    pattern: Regex,
}

impl RewriteRule {
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Replace every match in `input`. Borrows `input` when nothing matched.
    pub fn apply<'a>(&self, input: &'a [u8], endpoints: &Endpoints) -> Cow<'a, [u8]> {
        self.pattern.replace_all(input, |caps: &Captures<'_>| {
            let link = &caps[0];
            rewrite_link(link, classify(link, endpoints), endpoints)
        })
    }
}

/// Build the rule sequence for an origin host. Order is significant: later
/// rules re-scan the output of earlier ones.
pub fn ordered_rules(origin_host: &str) -> Result<Vec<RewriteRule>, regex::Error> {
    let host = regex::escape(origin_host);
    Ok(vec![
        RewriteRule::new(
            "absolute-origin-href",
            &format!(r#"href="https?://[^/"]*{host}[^"]*""#),
        )?,
        RewriteRule::new(
            "protocol-relative-origin-href",
            &format!(r#"href="//[^/"]*{host}[^"]*""#),
        )?,
        RewriteRule::new("content-href", r#"href="/wiki/[^"]*""#)?,
        RewriteRule::new("resource-href", r#"href="/w/[^"]*""#)?,
        RewriteRule::new("protocol-relative-src", r#"src="//[^"]*""#)?,
        RewriteRule::new("static-src", r#"src="/static/[^"]*""#)?,
        RewriteRule::new("style-url", r#"url\(['"]?//[^'")]*['"]?\)"#)?,
        RewriteRule::new(
            "css-import",
            r#"@import (?:"//[^"]*"|url\("//[^"]*"\))"#,
        )?,
    ])
}

/// Decide what a matched reference becomes.
pub fn classify(link: &[u8], endpoints: &Endpoints) -> LinkAction {
    if let Some((start, end)) = authority(link) {
        if link.starts_with(b"href=") && endpoints.names_origin(&link[start..end]) {
            return LinkAction::DomainSwap;
        }
        if link.starts_with(b"src=\"//") || contains(link, b"url(") || contains(link, b"@import") {
            return LinkAction::ProtocolUpgrade;
        }
    }
    if link.starts_with(b"href=\"/wiki/") {
        return LinkAction::PathRebase(Target::Mirror);
    }
    if link.starts_with(b"href=\"/w/") {
        return LinkAction::PathRebase(Target::Origin);
    }
    if link.starts_with(b"src=\"/") {
        return LinkAction::PathRebase(Target::Origin);
    }
    LinkAction::Noop
}

fn rewrite_link(link: &[u8], action: LinkAction, endpoints: &Endpoints) -> Vec<u8> {
    match action {
        LinkAction::DomainSwap => match authority(link) {
            // `end` sits on the path, query, fragment or closing quote.
            Some((_, end)) => concat(&[b"href=\"", endpoints.mirror_base.as_bytes(), &link[end..]]),
            None => link.to_vec(),
        },
        LinkAction::ProtocolUpgrade => match find(link, b"//") {
            Some(at) => concat(&[&link[..at], b"https://", &link[at + 2..]]),
            None => link.to_vec(),
        },
        LinkAction::PathRebase(target) => match find(link, b"\"") {
            Some(quote) => concat(&[
                &link[..=quote],
                endpoints.base(target).as_bytes(),
                &link[quote + 1..],
            ]),
            None => link.to_vec(),
        },
        LinkAction::Noop => link.to_vec(),
    }
}

/// Byte range of the authority (host and optional port) following the
/// first `//`, if any. It ends at the path, query, fragment or closing quote.
fn authority(link: &[u8]) -> Option<(usize, usize)> {
    let start = find(link, b"//")? + 2;
    let len = link[start..]
        .iter()
        .position(|b| matches!(b, b'/' | b'?' | b'#' | b'"' | b'\'' | b')'))
        .unwrap_or(link.len() - start);
    Some((start, start + len))
}

/// `host` from `host:port` when the port is all digits.
fn strip_port(authority: &[u8]) -> Option<&[u8]> {
    let colon = authority.iter().rposition(|b| *b == b':')?;
    let port = &authority[colon + 1..];
    (!port.is_empty() && port.iter().all(u8::is_ascii_digit)).then(|| &authority[..colon])
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle).is_some()
}

fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}
