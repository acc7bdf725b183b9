//! Social media announcement texts
//!
//! One document with a section per network, each headed `=== NAME ===`, ready
//! to be pasted by whoever publishes the posts.

use crate::error::{ReleaseError, ReleaseResult};
use crate::models::Session;
use relm_common::config::LabelConfig;

/// Inputs collected for the announcement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SocialInputs {
    /// Public DISCO playlist / client area link
    pub disco_link: String,
    pub youtube_link: String,
    pub description_en: String,
    pub description_ru: String,
}

impl SocialInputs {
    /// English description falls back to the one stored with the album
    pub fn new(
        session: &Session,
        disco_link: &str,
        youtube_link: &str,
        description_en: Option<String>,
        description_ru: Option<String>,
    ) -> ReleaseResult<Self> {
        let disco_link = disco_link.trim().to_string();
        let youtube_link = youtube_link.trim().to_string();
        if disco_link.is_empty() || youtube_link.is_empty() {
            return Err(ReleaseError::BadRequest(
                "both the DISCO and the YouTube link are required".to_string(),
            ));
        }
        Ok(Self {
            disco_link,
            youtube_link,
            description_en: description_en
                .or_else(|| session.album_description.clone())
                .unwrap_or_default()
                .trim()
                .to_string(),
            description_ru: description_ru.unwrap_or_default().trim().to_string(),
        })
    }
}

/// One network's post
#[derive(Debug, Clone, PartialEq)]
pub struct SocialPost {
    pub network: &'static str,
    pub text: String,
}

pub fn build_posts(session: &Session, inputs: &SocialInputs, label: &LabelConfig) -> Vec<SocialPost> {
    let title = session.album_title();
    let headline = format!("{} | New Album", title);
    let en = &inputs.description_en;
    let disco = &inputs.disco_link;
    let yt = &inputs.youtube_link;
    let client_area = format!("The album is available for listening in our client area: {}", disco);

    vec![
        SocialPost {
            network: "INSTAGRAM",
            text: format!("{}\n\n{}\n\n{}", headline, en, label.instagram_tags),
        },
        SocialPost {
            network: "FACEBOOK",
            text: format!("{}\n\n{}\n\n{}\nPreview: {}", headline, en, client_area, yt),
        },
        SocialPost {
            network: "LINKEDIN",
            text: format!(
                "{}\n\n{}\n\n{}\nPreview: {}\n\n{}",
                headline, en, client_area, yt, label.linkedin_tags
            ),
        },
        SocialPost {
            network: "VK",
            text: format!(
                "{} | Новый альбом\n\n{}\n\nАльбом уже доступен для прослушивания: {}\nПревью: {}",
                title, inputs.description_ru, disco, yt
            ),
        },
        SocialPost {
            network: "YOUTUBE",
            text: format!("{}\n\n{}\n\n{}", headline, en, client_area),
        },
    ]
}

/// All posts as one document
pub fn render_document(posts: &[SocialPost]) -> String {
    posts
        .iter()
        .map(|p| format!("=== {} ===\n{}", p.network, p.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            album_code: "IMG042".to_string(),
            album_name: "Rise".to_string(),
            album_description: Some("Stored description".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_links_are_required() {
        assert!(SocialInputs::new(&session(), "", "https://yt", None, None).is_err());
        assert!(SocialInputs::new(&session(), "https://disco", "  ", None, None).is_err());
    }

    #[test]
    fn test_description_defaults_to_session() {
        let inputs = SocialInputs::new(&session(), "https://disco", "https://yt", None, None).unwrap();
        assert_eq!(inputs.description_en, "Stored description");
        let inputs = SocialInputs::new(
            &session(),
            "https://disco",
            "https://yt",
            Some("Given".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(inputs.description_en, "Given");
    }

    #[test]
    fn test_document_sections() {
        let inputs = SocialInputs::new(
            &session(),
            "https://disco",
            "https://yt",
            None,
            Some("Описание".to_string()),
        )
        .unwrap();
        let posts = build_posts(&session(), &inputs, &LabelConfig::default());
        let doc = render_document(&posts);

        let headings: Vec<&str> = doc.lines().filter(|l| l.starts_with("===")).collect();
        assert_eq!(
            headings,
            [
                "=== INSTAGRAM ===",
                "=== FACEBOOK ===",
                "=== LINKEDIN ===",
                "=== VK ===",
                "=== YOUTUBE ==="
            ]
        );
        assert!(doc.starts_with("=== INSTAGRAM ===\nIMG042 Rise | New Album\n\nStored description\n\n#imaginemusic"));
        assert!(posts[1].text.ends_with("client area: https://disco\nPreview: https://yt"));
        assert!(posts[2].text.ends_with("#imaginemusic #trailermusic"));
        assert!(posts[3].text.contains("IMG042 Rise | Новый альбом\n\nОписание"));
        assert!(!posts[4].text.contains("Preview"));
    }
}
