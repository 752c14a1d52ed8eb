//! Per-call render configuration: element filter policy, URL policy,
//! components, and the binding environment.

use crate::error::{RenderError, RenderResult};
use mdsafe_types::ast::Element;
use mdsafe_types::{Bindings, Components};

/// Rewrites a URL-bearing attribute value. Receives the value, the
/// attribute name, and the element carrying it.
pub type UrlTransform = Box<dyn Fn(&str, &str, &Element) -> String + Send + Sync>;

/// Decides whether an element is kept. Receives the element, its index in
/// the parent's child list, and the parent's tag name (`None` at the
/// root). Consulted only when the allow/deny sets would keep the element.
pub type AllowElement = Box<dyn Fn(&Element, usize, Option<&str>) -> bool + Send + Sync>;

/// Configuration for one render call.
///
/// Treated as immutable for the duration of the call; independent calls
/// may share one instance across threads.
#[derive(Default)]
pub struct RenderOptions {
    /// Tag names to keep (everything else is removed). Cannot be combined
    /// with `disallowed_elements`.
    pub allowed_elements: Option<Vec<String>>,
    /// Tag names to remove. Cannot be combined with `allowed_elements`.
    pub disallowed_elements: Option<Vec<String>>,
    /// Per-element override, consulted when the sets keep the element.
    pub allow_element: Option<AllowElement>,
    /// Splice a removed element's children into its place instead of
    /// dropping the subtree.
    pub unwrap_disallowed: bool,
    /// Delete raw HTML nodes entirely instead of defanging them to text.
    pub skip_raw_html: bool,
    /// URL policy; defaults to [`default_url_transform`].
    pub url_transform: Option<UrlTransform>,
    /// Tag name → component substitutions.
    pub components: Components,
    /// The binding environment for the evaluation session.
    pub bindings: Bindings,
}

impl RenderOptions {
    /// Check the policy for conflicts. Called before any traversal.
    pub fn validate(&self) -> RenderResult<()> {
        if self.allowed_elements.is_some() && self.disallowed_elements.is_some() {
            return Err(RenderError::InvalidPolicy(
                "allowed_elements and disallowed_elements cannot be combined; \
                 set one or the other"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Apply the configured URL transform, or the default one.
    pub(crate) fn transform_url(&self, value: &str, attr: &str, element: &Element) -> String {
        match &self.url_transform {
            Some(transform) => transform(value, attr, element),
            None => default_url_transform(value),
        }
    }

    /// The removal decision for one element.
    pub(crate) fn element_removed(
        &self,
        element: &Element,
        index: usize,
        parent: Option<&str>,
    ) -> bool {
        let mut remove = if let Some(allowed) = &self.allowed_elements {
            !allowed.iter().any(|t| t == &element.name)
        } else if let Some(disallowed) = &self.disallowed_elements {
            disallowed.iter().any(|t| t == &element.name)
        } else {
            false
        };
        if !remove {
            if let Some(predicate) = &self.allow_element {
                remove = !predicate(element, index, parent);
            }
        }
        remove
    }
}

/// Schemes a URL may carry and still pass the default transform.
const SAFE_SCHEMES: &[&str] = &["http", "https", "irc", "ircs", "mailto", "xmpp"];

/// The default URL policy.
///
/// Keeps relative URLs (no scheme, or a `:` that appears after the first
/// `/`, `?` or `#`) and the schemes in [`SAFE_SCHEMES`]. Everything else
/// is rewritten to the empty string — not dropped, so the surrounding
/// markup structure survives.
pub fn default_url_transform(value: &str) -> String {
    let Some(colon) = value.find(':') else {
        // No scheme: relative.
        return value.to_string();
    };

    let before_colon = |idx: Option<usize>| idx.is_some_and(|i| i < colon);
    if before_colon(value.find('/')) || before_colon(value.find('?')) || before_colon(value.find('#'))
    {
        // The colon is not part of a scheme.
        return value.to_string();
    }

    let scheme = &value[..colon];
    if SAFE_SCHEMES.iter().any(|s| scheme.eq_ignore_ascii_case(s)) {
        value.to_string()
    } else {
        String::new()
    }
}

/// URL-bearing attributes: attribute name → tags it applies to (`None`
/// means any tag).
const URL_ATTRIBUTES: &[(&str, Option<&[&str]>)] = &[
    ("action", Some(&["form"])),
    ("cite", Some(&["blockquote", "del", "ins", "q"])),
    ("data", Some(&["object"])),
    ("formaction", Some(&["button", "input"])),
    ("href", Some(&["a", "area", "base", "link"])),
    ("icon", Some(&["menuitem"])),
    ("itemid", None),
    ("manifest", Some(&["html"])),
    ("ping", Some(&["a", "area"])),
    ("poster", Some(&["video"])),
    (
        "src",
        Some(&[
            "audio", "embed", "iframe", "img", "input", "script", "source", "track", "video",
        ]),
    ),
];

/// Look up whether an attribute is URL-bearing, and on which tags.
pub(crate) fn url_attribute_tags(attr: &str) -> Option<Option<&'static [&'static str]>> {
    URL_ATTRIBUTES
        .iter()
        .find(|(name, _)| *name == attr)
        .map(|(_, tags)| *tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transform_keeps_safe_schemes() {
        assert_eq!(default_url_transform("https://x.com"), "https://x.com");
        assert_eq!(default_url_transform("http://x.com"), "http://x.com");
        assert_eq!(default_url_transform("mailto:a@b.c"), "mailto:a@b.c");
        assert_eq!(default_url_transform("irc://chat/room"), "irc://chat/room");
        assert_eq!(default_url_transform("HTTPS://X.COM"), "HTTPS://X.COM");
    }

    #[test]
    fn default_transform_rejects_unsafe_schemes() {
        assert_eq!(default_url_transform("javascript:x"), "");
        assert_eq!(default_url_transform("vbscript:msgbox"), "");
        assert_eq!(default_url_transform("data:text/html,x"), "");
        assert_eq!(default_url_transform("file:///etc/passwd"), "");
    }

    #[test]
    fn default_transform_keeps_relative_urls() {
        assert_eq!(default_url_transform("/relative/path"), "/relative/path");
        assert_eq!(default_url_transform("relative"), "relative");
        assert_eq!(default_url_transform("?q=1"), "?q=1");
        assert_eq!(default_url_transform("#frag"), "#frag");
        assert_eq!(default_url_transform(""), "");
    }

    #[test]
    fn default_transform_colon_after_delimiter_is_relative() {
        // The colon is past a `/`, `?` or `#`, so there is no scheme.
        assert_eq!(default_url_transform("/a:b"), "/a:b");
        assert_eq!(default_url_transform("?q=a:b"), "?q=a:b");
        assert_eq!(default_url_transform("#a:b"), "#a:b");
    }

    #[test]
    fn url_attribute_table() {
        assert_eq!(url_attribute_tags("href"), Some(Some(&["a", "area", "base", "link"][..])));
        assert_eq!(url_attribute_tags("itemid"), Some(None));
        assert_eq!(url_attribute_tags("class"), None);
    }
}
