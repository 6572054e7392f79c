//! Provider-side image transformation URLs.
//!
//! Neither Cloudinary nor Supabase needs us to resize images ourselves: both
//! accept transformation parameters in the delivery URL. These helpers build
//! those URLs so templates can emit `srcset` attributes and tiny blurred
//! placeholders. URLs from any other origin (including local `/uploads/...`
//! paths) pass through untouched.

use url::Url;

/// Widths offered in `srcset` attributes.
pub const RESPONSIVE_WIDTHS: [u32; 4] = [400, 800, 1200, 1600];

/// Output encoding requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Webp,
    Avif,
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Supabase `format=` value.
    const fn supabase(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Avif => "avif",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    /// Cloudinary `f_` value.
    const fn cloudinary(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Avif => "avif",
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// How the image is fitted into the requested box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    #[default]
    Cover,
    Contain,
    Fill,
}

impl ResizeMode {
    const fn supabase(self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Contain => "contain",
            Self::Fill => "fill",
        }
    }

    const fn cloudinary(self) -> &'static str {
        match self {
            Self::Cover => "fill",
            Self::Contain => "fit",
            Self::Fill => "scale",
        }
    }
}

/// Requested transformation. Unset dimensions keep the source size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageTransform {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: u8,
    pub format: ImageFormat,
    pub resize: ResizeMode,
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            quality: 80,
            format: ImageFormat::default(),
            resize: ResizeMode::default(),
        }
    }
}

impl ImageTransform {
    /// Default transform at a fixed width.
    #[must_use]
    pub fn width(width: u32) -> Self {
        Self {
            width: Some(width),
            ..Self::default()
        }
    }
}

enum Provider {
    Supabase,
    Cloudinary,
}

fn provider_of(url: &Url) -> Option<Provider> {
    let host = url.host_str()?;
    if host.contains("supabase.co") {
        Some(Provider::Supabase)
    } else if host == "res.cloudinary.com" && url.path().contains("/upload/") {
        Some(Provider::Cloudinary)
    } else {
        None
    }
}

/// Whether [`optimize_url`] would rewrite this URL.
#[must_use]
pub fn is_transformable(src: &str) -> bool {
    Url::parse(src).ok().as_ref().and_then(provider_of).is_some()
}

/// Rewrite a delivery URL to request the given transformation.
///
/// Returns the input unchanged when it is not a Supabase or Cloudinary URL.
#[must_use]
pub fn optimize_url(src: &str, transform: &ImageTransform) -> String {
    let Ok(mut url) = Url::parse(src) else {
        return src.to_string();
    };

    match provider_of(&url) {
        Some(Provider::Supabase) => {
            apply_supabase(&mut url, transform);
            url.into()
        }
        Some(Provider::Cloudinary) => {
            let segment = cloudinary_segment(transform);
            let path = url.path().replacen("/upload/", &format!("/upload/{segment}/"), 1);
            url.set_path(&path);
            url.into()
        }
        None => src.to_string(),
    }
}

fn apply_supabase(url: &mut Url, transform: &ImageTransform) {
    const KEYS: [&str; 5] = ["width", "height", "quality", "format", "resize"];

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !KEYS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut query = url.query_pairs_mut();
    query.clear();
    for (k, v) in &kept {
        query.append_pair(k, v);
    }
    if let Some(width) = transform.width {
        query.append_pair("width", &width.to_string());
    }
    if let Some(height) = transform.height {
        query.append_pair("height", &height.to_string());
    }
    query.append_pair("quality", &transform.quality.to_string());
    query.append_pair("format", transform.format.supabase());
    query.append_pair("resize", transform.resize.supabase());
}

fn cloudinary_segment(transform: &ImageTransform) -> String {
    let mut parts = Vec::with_capacity(5);
    if let Some(width) = transform.width {
        parts.push(format!("w_{width}"));
    }
    if let Some(height) = transform.height {
        parts.push(format!("h_{height}"));
    }
    parts.push(format!("q_{}", transform.quality));
    parts.push(format!("f_{}", transform.format.cloudinary()));
    parts.push(format!("c_{}", transform.resize.cloudinary()));
    parts.join(",")
}

/// `srcset` value covering [`RESPONSIVE_WIDTHS`], or an empty string when the
/// URL cannot be transformed.
#[must_use]
pub fn responsive_srcset(src: &str) -> String {
    if !is_transformable(src) {
        return String::new();
    }

    RESPONSIVE_WIDTHS
        .iter()
        .map(|&w| format!("{} {w}w", optimize_url(src, &ImageTransform::width(w))))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Tiny low-quality JPEG used as a blur-up placeholder.
#[must_use]
pub fn placeholder_url(src: &str) -> String {
    optimize_url(
        src,
        &ImageTransform {
            width: Some(50),
            height: Some(50),
            quality: 20,
            format: ImageFormat::Jpeg,
            resize: ResizeMode::Cover,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPABASE: &str =
        "https://abc.supabase.co/storage/v1/object/public/images/furniture-store/1-meja.jpg";
    const CLOUDINARY: &str =
        "https://res.cloudinary.com/demo/image/upload/v1700000000/furniture-store/1-meja.jpg";

    #[test]
    fn test_local_urls_pass_through() {
        let local = "/uploads/1700000000000-meja.jpg";
        assert_eq!(optimize_url(local, &ImageTransform::width(400)), local);
        assert_eq!(responsive_srcset(local), "");
        assert!(!is_transformable("https://example.com/a.jpg"));
    }

    #[test]
    fn test_supabase_query_params() {
        let url = optimize_url(SUPABASE, &ImageTransform::width(800));
        assert_eq!(
            url,
            format!("{SUPABASE}?width=800&quality=80&format=webp&resize=cover")
        );
    }

    #[test]
    fn test_supabase_replaces_existing_params() {
        let first = optimize_url(SUPABASE, &ImageTransform::width(800));
        let second = optimize_url(&first, &ImageTransform::width(400));
        assert_eq!(second.matches("width=").count(), 1);
        assert!(second.contains("width=400"));
    }

    #[test]
    fn test_cloudinary_segment() {
        let url = optimize_url(CLOUDINARY, &ImageTransform::width(400));
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/w_400,q_80,f_webp,c_fill/v1700000000/furniture-store/1-meja.jpg"
        );
    }

    #[test]
    fn test_placeholder() {
        let url = placeholder_url(CLOUDINARY);
        assert!(url.contains("/upload/w_50,h_50,q_20,f_jpg,c_fill/"));
    }

    #[test]
    fn test_srcset_lists_all_widths() {
        let srcset = responsive_srcset(SUPABASE);
        for w in RESPONSIVE_WIDTHS {
            assert!(srcset.contains(&format!("width={w}&")));
            assert!(srcset.contains(&format!(" {w}w")));
        }
        assert_eq!(srcset.matches(", ").count(), 3);
    }
}
