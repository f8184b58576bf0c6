/// Turn a display name into a filename-safe slug.
///
/// Non-alphanumerics become `-` and lower/upper camel boundaries are split,
/// so `"Idle/LookAround"` becomes `"idle-look-around"`.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            if prev_lower && c.is_ascii_uppercase() {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = c.is_ascii_lowercase();
        } else {
            out.push('-');
            prev_lower = false;
        }
    }
    out
}
