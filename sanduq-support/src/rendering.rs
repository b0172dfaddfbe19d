//! Text rendering for container diagnostics.
//!
//! Error messages and `Display` output of the registry go through these
//! helpers so that type names, resolution chains and listings look the
//! same everywhere.

/// Joins a resolution chain with arrows.
///
/// ```
/// use sanduq_support::rendering::render_chain;
///
/// assert_eq!(render_chain(&["App", "Mailer", "App"]), "App → Mailer → App");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    let mut out = String::new();
    for (i, link) in chain.iter().enumerate() {
        if i > 0 {
            out.push_str(" → ");
        }
        out.push_str(link.as_ref());
    }
    out
}

/// Strips module paths from a type name, keeping generic structure.
///
/// ```
/// use sanduq_support::rendering::short_type_name;
///
/// assert_eq!(short_type_name("app::db::LocalDatabase"), "LocalDatabase");
/// assert_eq!(
///     short_type_name("alloc::sync::Arc<dyn app::db::DatabaseProtocol>"),
///     "Arc<dyn DatabaseProtocol>",
/// );
/// ```
pub fn short_type_name(full_name: &str) -> String {
    let mut out = String::with_capacity(full_name.len());
    let mut segment_start = 0;
    let bytes = full_name.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b':' if bytes.get(i + 1) == Some(&b':') => {
                i += 2;
                segment_start = i;
                continue;
            }
            b'<' | b'>' | b',' | b' ' | b'(' | b')' | b'[' | b']' | b'&' => {
                out.push_str(&full_name[segment_start..i]);
                out.push(bytes[i] as char);
                segment_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    out.push_str(&full_name[segment_start..]);
    out
}

/// Renders a titled listing used by registry descriptions.
///
/// ```
/// use sanduq_support::rendering::render_section;
///
/// let empty: Vec<String> = Vec::new();
/// assert_eq!(render_section("Providers", &empty), "Providers:\n- none");
/// assert_eq!(render_section("Services", &["Mailer"]), "Services:\n- Mailer");
/// ```
pub fn render_section(title: &str, entries: &[impl AsRef<str>]) -> String {
    let mut out = format!("{title}:");
    if entries.is_empty() {
        out.push_str("\n- none");
    }
    for entry in entries {
        out.push_str("\n- ");
        out.push_str(entry.as_ref());
    }
    out
}
