use url::Url;

/// Derives the storage public id from a Cloudinary-style delivery URL.
///
/// The path after `/upload/` is `<version>/<public id>.<ext>`; the version
/// segment is dropped, the extension stripped, and percent-escapes decoded so
/// the result matches what the upload API originally returned.
pub fn public_id_from_url(resume_url: &str) -> Option<String> {
    let parsed = Url::parse(resume_url).ok()?;
    let path = parsed.path();
    let after_upload = path.split("/upload/").nth(1)?;

    let mut segments = after_upload.split('/');
    // first segment is the version marker (v1712345678)
    segments.next()?;
    let rest: Vec<&str> = segments.collect();
    if rest.is_empty() {
        return None;
    }

    let joined = rest.join("/");
    let without_ext = match joined.find('.') {
        Some(idx) => joined[..idx].to_string(),
        None => joined,
    };
    let decoded = percent_decode(&without_ext);
    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(byte) = u8::from_str_radix(&input[i + 1..i + 3], 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Builds a download-safe filename: special characters replaced, `.pdf`
/// extension guaranteed.
pub fn safe_resume_filename(original: Option<&str>) -> String {
    let raw = match original {
        Some(name) if !name.is_empty() => name,
        _ => "resume.pdf",
    };
    let mut cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !cleaned.ends_with(".pdf") {
        cleaned.push_str(".pdf");
    }
    cleaned
}
