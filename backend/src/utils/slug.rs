use chrono::Utc;

/// Builds a URL slug from a topic title: accents folded to ASCII, anything
/// that is not alphanumeric/space/hyphen dropped, whitespace collapsed to
/// single hyphens, and a millisecond suffix appended so two topics with the
/// same title never collide.
pub fn generate_slug(title: &str) -> String {
    let base = slugify(title);
    format!("{}-{}", base, Utc::now().timestamp_millis())
}

fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.chars().filter_map(fold_ascii) {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_hyphen = true;
        }
        // other punctuation is dropped entirely
    }
    out
}

/// Maps common Latin-1 accented characters onto their ASCII base letter.
/// Anything else non-ASCII is removed, matching how slugs look in the
/// existing data set.
fn fold_ascii(c: char) -> Option<char> {
    if c.is_ascii() {
        return Some(c);
    }
    let folded = match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'u',
        'ç' | 'Ç' => 'c',
        'ñ' | 'Ñ' => 'n',
        _ => return None,
    };
    Some(folded)
}
