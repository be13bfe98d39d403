//! Renders a deployment outcome into the fixed Block Kit attachment.
//!
//! The layout is always six blocks:
//!
//! 1. header with the status line
//! 2. section with the release number
//! 3. divider
//! 4. section with the status icon and the Host / Branch / PHP version /
//!    Created by fields
//! 5. divider
//! 6. section with a "View" button linking to the GitHub run
//!
//! Values are substituted verbatim. Slack mrkdwn control characters in
//! option values are not escaped.

use tracing::debug;

use super::blocks::{Accessory, Attachment, Block, TextObject};
use super::options::DeploymentOptions;
use crate::errors::NotificationError;

pub const SUCCESS_COLOR: &str = "#00c100";
pub const FAILURE_COLOR: &str = "#ff0909";
pub const SUCCESS_ICON_URL: &str = "https://marshmallow.dev/storage/slack/success.png";
pub const FAILURE_ICON_URL: &str = "https://marshmallow.dev/storage/slack/failed.png";

/// `action_id` of the "View" button.
pub const BUTTON_ACTION_ID: &str = "button-action";

/// Number of blocks in every rendered attachment.
pub const BLOCK_COUNT: usize = 6;

/// Outcome of a deployment, selecting color, status line, and icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentStatus<'a> {
    Succeeded,
    /// `task` is the task that failed; rendered as `''` when unknown.
    Failed { task: Option<&'a str> },
}

impl<'a> DeploymentStatus<'a> {
    pub fn from_flag(success: bool, task: Option<&'a str>) -> Self {
        if success {
            DeploymentStatus::Succeeded
        } else {
            DeploymentStatus::Failed { task }
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            DeploymentStatus::Succeeded => SUCCESS_COLOR,
            DeploymentStatus::Failed { .. } => FAILURE_COLOR,
        }
    }

    pub fn icon_url(&self) -> &'static str {
        match self {
            DeploymentStatus::Succeeded => SUCCESS_ICON_URL,
            DeploymentStatus::Failed { .. } => FAILURE_ICON_URL,
        }
    }

    /// The status line used for the attachment text and the header block.
    pub fn headline(&self, host: &str, branch: &str) -> String {
        match self {
            DeploymentStatus::Succeeded => {
                format!("✅ Deployment for {} ({}) is successful", host, branch)
            }
            DeploymentStatus::Failed { task } => format!(
                "⛔️ Deployment for {} ({}) failed on task '{}'",
                host,
                branch,
                task.unwrap_or_default()
            ),
        }
    }
}

/// Build the attachment for a deployment.
///
/// An empty `options` renders with [`DeploymentOptions::placeholder`]. A
/// non-empty set missing any string key fails with
/// [`NotificationError::MissingField`] naming the first missing key, checked
/// in the order host, branch, release, php_version, user, github_url.
pub fn build_attachment(
    options: &DeploymentOptions,
    success: bool,
    task: Option<&str>,
) -> Result<Attachment, NotificationError> {
    let options = options.or_placeholder();
    let status = DeploymentStatus::from_flag(success, task);

    let host = options.require("host")?;
    let branch = options.require("branch")?;
    let release = options.require("release")?;
    let php_version = options.require("php_version")?;
    let user = options.require("user")?;
    let github_url = options.require("github_url")?;

    let headline = status.headline(host, branch);
    debug!(success, host, branch, release, "rendering deployment attachment");

    let blocks = vec![
        Block::header(headline.clone()),
        Block::section(TextObject::plain(format!(
            "With release number #{}",
            release
        ))),
        Block::divider(),
        Block::Section {
            text: None,
            accessory: Some(Accessory::Image {
                image_url: status.icon_url().to_string(),
                alt_text: status.icon_url().to_string(),
            }),
            fields: vec![
                field("Host", host),
                field("Branch", branch),
                field("PHP version", php_version),
                field("Created by", user),
            ],
        },
        Block::divider(),
        Block::Section {
            text: Some(TextObject::markdown("View the action on GitHub")),
            accessory: Some(Accessory::Button {
                text: TextObject::plain("View"),
                url: github_url.to_string(),
                action_id: BUTTON_ACTION_ID.to_string(),
            }),
            fields: Vec::new(),
        },
    ];

    Ok(Attachment {
        color: status.color().to_string(),
        text: headline,
        blocks,
    })
}

fn field(label: &str, value: &str) -> TextObject {
    TextObject::markdown(format!("*{}:*\n{}", label, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_options() -> DeploymentOptions {
        DeploymentOptions {
            success: None,
            host: Some("web1".into()),
            release: Some("42".into()),
            user: Some("alice".into()),
            branch: Some("main".into()),
            php_version: Some("8.2".into()),
            github_url: Some("https://github.com/org/repo/actions/1".into()),
        }
    }

    fn header_text(attachment: &Attachment) -> &str {
        match &attachment.blocks[0] {
            Block::Header { text } => text.text(),
            other => panic!("expected header, got {:?}", other),
        }
    }

    fn fields(attachment: &Attachment) -> Vec<&str> {
        match &attachment.blocks[3] {
            Block::Section { fields, .. } => fields.iter().map(TextObject::text).collect(),
            other => panic!("expected section, got {:?}", other),
        }
    }

    #[test]
    fn test_success_headline_and_color() {
        let attachment = build_attachment(&sample_options(), true, None).unwrap();
        assert_eq!(attachment.color, "#00c100");
        assert_eq!(
            header_text(&attachment),
            "✅ Deployment for web1 (main) is successful"
        );
        assert_eq!(attachment.text, header_text(&attachment));
    }

    #[test]
    fn test_failure_headline_names_task() {
        let attachment = build_attachment(&sample_options(), false, Some("migrate")).unwrap();
        assert_eq!(attachment.color, "#ff0909");
        assert_eq!(
            header_text(&attachment),
            "⛔️ Deployment for web1 (main) failed on task 'migrate'"
        );
    }

    #[test]
    fn test_failure_without_task_renders_empty_quotes() {
        let attachment = build_attachment(&sample_options(), false, None).unwrap();
        assert!(attachment.text.ends_with("failed on task ''"));
    }

    #[test]
    fn test_success_ignores_task() {
        let attachment = build_attachment(&sample_options(), true, Some("migrate")).unwrap();
        assert!(!attachment.text.contains("migrate"));
    }

    #[test]
    fn test_block_order_is_fixed() {
        for success in [true, false] {
            let attachment = build_attachment(&sample_options(), success, None).unwrap();
            let kinds: Vec<&str> = attachment.blocks.iter().map(Block::kind).collect();
            assert_eq!(
                kinds,
                ["header", "section", "divider", "section", "divider", "section"]
            );
            assert_eq!(attachment.blocks.len(), BLOCK_COUNT);
        }
    }

    #[test]
    fn test_release_section() {
        let attachment = build_attachment(&sample_options(), true, None).unwrap();
        assert_eq!(
            attachment.blocks[1],
            Block::section(TextObject::plain("With release number #42"))
        );
    }

    #[test]
    fn test_fields_in_fixed_order() {
        let attachment = build_attachment(&sample_options(), true, None).unwrap();
        assert_eq!(
            fields(&attachment),
            [
                "*Host:*\nweb1",
                "*Branch:*\nmain",
                "*PHP version:*\n8.2",
                "*Created by:*\nalice",
            ]
        );
    }

    #[test]
    fn test_status_icon_follows_outcome() {
        for (success, url) in [(true, SUCCESS_ICON_URL), (false, FAILURE_ICON_URL)] {
            let attachment = build_attachment(&sample_options(), success, None).unwrap();
            match &attachment.blocks[3] {
                Block::Section {
                    accessory: Some(Accessory::Image { image_url, alt_text }),
                    ..
                } => {
                    assert_eq!(image_url, url);
                    assert_eq!(alt_text, url);
                }
                other => panic!("expected image section, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_button_url_is_passed_through() {
        let mut options = sample_options();
        options.github_url = Some("https://github.com/org/repo/actions/runs/7?x=1&y=<2>".into());
        let attachment = build_attachment(&options, false, Some("deploy")).unwrap();
        match &attachment.blocks[5] {
            Block::Section {
                text: Some(text),
                accessory: Some(Accessory::Button { text: label, url, action_id }),
                ..
            } => {
                assert_eq!(text.text(), "View the action on GitHub");
                assert_eq!(label.text(), "View");
                assert_eq!(url, "https://github.com/org/repo/actions/runs/7?x=1&y=<2>");
                assert_eq!(action_id, BUTTON_ACTION_ID);
            }
            other => panic!("expected button section, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_options_use_placeholders() {
        let attachment = build_attachment(&DeploymentOptions::default(), true, None).unwrap();
        assert_eq!(
            fields(&attachment),
            [
                "*Host:*\nhost",
                "*Branch:*\nbranch",
                "*PHP version:*\nphp version",
                "*Created by:*\nuser",
            ]
        );
        assert_eq!(attachment.text, "✅ Deployment for host (branch) is successful");
    }

    #[test]
    fn test_incomplete_options_fail_fast() {
        let mut options = sample_options();
        options.php_version = None;
        let result = build_attachment(&options, true, None);
        assert!(matches!(
            result,
            Err(NotificationError::MissingField { key: "php_version" })
        ));
    }

    #[test]
    fn test_values_are_not_escaped() {
        let mut options = sample_options();
        options.host = Some("*web1*".into());
        let attachment = build_attachment(&options, true, None).unwrap();
        assert_eq!(fields(&attachment)[0], "*Host:*\n*web1*");
    }
}
