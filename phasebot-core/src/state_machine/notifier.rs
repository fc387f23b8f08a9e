//! Reply comment rendering.

use super::effect::CommentContent;

const FOOTER: &str = "---\n_phasebot_";

/// Format comment content as GitHub Markdown.
pub fn format_comment_content(content: &CommentContent) -> String {
    match content {
        CommentContent::Assigned { volunteer, phase } => {
            format!(
                "👋 Thanks for volunteering, @{}!\n\n\
                This issue is now assigned to you for **{}**.\n\n\
                {}",
                volunteer, phase.label, FOOTER
            )
        }

        CommentContent::AlreadyAssigned {
            requester,
            assignees,
        } => {
            let owners = assignees
                .iter()
                .map(|login| format!("@{}", login))
                .collect::<Vec<_>>()
                .join(", ");

            format!(
                "ℹ️ Sorry @{}, this issue is already assigned to {}.\n\n\
                {}",
                requester, owners, FOOTER
            )
        }

        CommentContent::NotAssignee { requester } => {
            format!(
                "⛔ @{}, only an assignee of this issue can mark the current phase complete.\n\n\
                {}",
                requester, FOOTER
            )
        }

        CommentContent::Advanced { author, from, to } => {
            format!(
                "✅ Thanks @{}! **{}** is complete.\n\n\
                This issue has moved to **{}** and is ready for a new volunteer.\n\n\
                {}",
                author, from.label, to.label, FOOTER
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::phase::Phase;
    use insta::assert_snapshot;

    fn phase(index: usize, label: &str) -> Phase {
        Phase {
            index,
            label: label.to_string(),
        }
    }

    #[test]
    fn test_format_assigned() {
        let content = CommentContent::Assigned {
            volunteer: "alice".to_string(),
            phase: phase(0, "phase1"),
        };

        assert_snapshot!(format_comment_content(&content), @r"
        👋 Thanks for volunteering, @alice!

        This issue is now assigned to you for **phase1**.

        ---
        _phasebot_
        ");
    }

    #[test]
    fn test_format_already_assigned_lists_everyone() {
        let content = CommentContent::AlreadyAssigned {
            requester: "bob".to_string(),
            assignees: vec!["alice".to_string(), "carol".to_string()],
        };

        let formatted = format_comment_content(&content);
        assert!(formatted.contains("Sorry @bob"));
        assert!(formatted.contains("already assigned to @alice, @carol."));
    }

    #[test]
    fn test_format_not_assignee() {
        let content = CommentContent::NotAssignee {
            requester: "mallory".to_string(),
        };

        let formatted = format_comment_content(&content);
        assert!(formatted.starts_with("⛔ @mallory"));
        assert!(formatted.ends_with(FOOTER));
    }

    #[test]
    fn test_format_advanced() {
        let content = CommentContent::Advanced {
            author: "alice".to_string(),
            from: phase(0, "phase1"),
            to: phase(1, "phase2"),
        };

        assert_snapshot!(format_comment_content(&content), @r"
        ✅ Thanks @alice! **phase1** is complete.

        This issue has moved to **phase2** and is ready for a new volunteer.

        ---
        _phasebot_
        ");
    }
}
