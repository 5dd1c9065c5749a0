//! The link and QR code a desktop shows to hand its session to a phone.

use facepass_types::HandoverToken;
use qrcode::render::{svg, unicode};
use qrcode::QrCode;
use reqwest::Url;

use crate::error::HandoverError;

/// Client route the phone opens.
pub const HANDOVER_PATH: &str = "handover";
/// Query parameter carrying the token.
pub const TOKEN_PARAM: &str = "t";

/// Edge length of the rendered SVG, in pixels.
const SVG_SIZE: u32 = 200;

/// A handover link together with its QR encoding.
pub struct HandoverCode {
    link: String,
    qr: QrCode,
}

impl HandoverCode {
    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn to_svg(&self) -> String {
        self.qr
            .render::<svg::Color>()
            .min_dimensions(SVG_SIZE, SVG_SIZE)
            .build()
    }

    /// Half-block rendering for a dark-background terminal.
    pub fn to_terminal(&self) -> String {
        self.qr
            .render::<unicode::Dense1x2>()
            .dark_color(unicode::Dense1x2::Light)
            .light_color(unicode::Dense1x2::Dark)
            .build()
    }
}

impl std::fmt::Debug for HandoverCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandoverCode")
            .field("qr_width", &self.qr.width())
            .finish_non_exhaustive()
    }
}

/// Check `base` and return `<base>/handover`, ready for the token.
///
/// `base` is the publicly reachable URL of the web client; without it no
/// link can be produced. Callers can use this to fail before asking the
/// server for a token.
pub fn handover_route(base: Option<&str>) -> Result<Url, HandoverError> {
    let base = base
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .ok_or(HandoverError::ConfigurationMissing)?
        .trim_end_matches('/');

    let mut url =
        Url::parse(base).map_err(|e| HandoverError::InvalidBaseUrl(format!("{base}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(HandoverError::InvalidBaseUrl(format!(
            "{base}: unsupported scheme {}",
            url.scheme()
        )));
    }
    // Anything after the path would swallow the handover route.
    if url.query().is_some() || url.fragment().is_some() {
        return Err(HandoverError::InvalidBaseUrl(format!(
            "{base}: must not carry a query or fragment"
        )));
    }
    url.path_segments_mut()
        .map_err(|_| HandoverError::InvalidBaseUrl(format!("{base}: cannot hold a path")))?
        .pop_if_empty()
        .push(HANDOVER_PATH);
    Ok(url)
}

/// Build `<base>/handover?t=<token>` and encode it.
pub fn render_handover_code(
    token: &HandoverToken,
    base: Option<&str>,
) -> Result<HandoverCode, HandoverError> {
    let mut url = handover_route(base)?;
    url.query_pairs_mut().append_pair(TOKEN_PARAM, token.as_str());

    let link = url.to_string();
    let qr = QrCode::new(link.as_bytes()).map_err(|e| HandoverError::Encode(e.to_string()))?;
    Ok(HandoverCode { link, qr })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> HandoverToken {
        HandoverToken::new("abc123").unwrap()
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let code = render_handover_code(&token(), Some("https://app.example/")).unwrap();
        assert_eq!(code.link(), "https://app.example/handover?t=abc123");

        let code = render_handover_code(&token(), Some("https://app.example")).unwrap();
        assert_eq!(code.link(), "https://app.example/handover?t=abc123");
    }

    #[test]
    fn base_with_path_is_kept() {
        let code = render_handover_code(&token(), Some("http://10.0.0.5:5173/app/")).unwrap();
        assert_eq!(code.link(), "http://10.0.0.5:5173/app/handover?t=abc123");
    }

    #[test]
    fn missing_base_is_configuration_error() {
        assert_eq!(
            render_handover_code(&token(), None).unwrap_err(),
            HandoverError::ConfigurationMissing
        );
        assert_eq!(
            render_handover_code(&token(), Some("  ")).unwrap_err(),
            HandoverError::ConfigurationMissing
        );
    }

    #[test]
    fn garbage_base_is_rejected() {
        assert!(matches!(
            render_handover_code(&token(), Some("not a url")),
            Err(HandoverError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            render_handover_code(&token(), Some("ftp://files.example")),
            Err(HandoverError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn base_with_fragment_or_query_is_rejected() {
        for base in [
            "https://app.example/#/",
            "https://app.example/?ref=qr",
            "https://app.example/app?",
        ] {
            assert!(
                matches!(
                    render_handover_code(&token(), Some(base)),
                    Err(HandoverError::InvalidBaseUrl(_))
                ),
                "{base} should be rejected"
            );
        }
    }

    #[test]
    fn renders_svg_and_terminal() {
        let code = render_handover_code(&token(), Some("https://app.example")).unwrap();
        let svg = code.to_svg();
        assert!(svg.contains("<svg"));
        assert!(code.to_terminal().lines().count() > 10);
    }

    #[test]
    fn token_is_query_encoded() {
        let token = HandoverToken::new("a b&c").unwrap();
        let code = render_handover_code(&token, Some("https://app.example")).unwrap();
        assert_eq!(code.link(), "https://app.example/handover?t=a+b%26c");
    }
}
