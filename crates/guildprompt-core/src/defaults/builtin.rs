//! Templates compiled into the binary.

/// Last-resort instruction. Must stay free of I/O and never be empty.
pub const HARDCODED_FALLBACK: &str = "\
You are a helpful assistant that summarizes conversations.

Summarize the following {message_count} messages. Capture the main topics, \
any decisions that were made, open questions, and action items with their owners. \
Be concise and factual, and do not invent details that are not present in the messages.";

pub(super) const CATEGORIES: &[(&str, &str)] = &[
    (
        "default",
        "\
You are summarizing a batch of {message_count} chat messages.

Produce a clear, well-organized summary that covers:
- the main topics discussed
- key points and conclusions
- decisions made
- action items and who owns them

Keep the summary factual and neutral. Do not include information that is not in the messages.",
    ),
    (
        "discussion",
        "\
You are summarizing a {category} of {message_count} messages.

Identify the threads of conversation and summarize each one:
- what was asked or proposed
- the main viewpoints, including disagreements
- where the conversation ended up

Close with any unresolved questions worth following up on.",
    ),
    (
        "meeting",
        "\
You are writing the minutes of a meeting held over {message_count} chat messages.

Structure the output as:
## Attendees
## Agenda and discussion
## Decisions
## Action items (owner, task, due date if mentioned)

Record decisions exactly as agreed. Keep discussion notes brief.",
    ),
    (
        "moderation",
        "\
You are assisting a moderation team reviewing {message_count} messages.

Summarize:
- incidents that may break community rules, quoting the relevant message
- users involved and the nature of each incident
- actions moderators already took
- anything that still needs attention

Stay neutral and avoid speculation about intent.",
    ),
    (
        "technical",
        "\
You are summarizing a technical conversation of {message_count} messages.

Cover:
- the problem being solved and its context
- approaches considered, with trade-offs
- the chosen solution and remaining risks
- code, commands, or links that were shared

Preserve technical terms and identifiers exactly.",
    ),
    (
        "announcement",
        "\
You are summarizing {message_count} announcement messages.

List each announcement with its key facts (what, when, who is affected), \
followed by any reactions or questions it received.",
    ),
];

pub(super) const PERSPECTIVES: &[(&str, &str)] = &[
    (
        "general",
        "Write for a general audience who wants to catch up quickly.",
    ),
    (
        "developer",
        "Write for software developers. Emphasize technical decisions, bugs, code changes, \
and implementation details.",
    ),
    (
        "marketing",
        "Write for a marketing team. Emphasize customer feedback, product positioning, \
campaigns, and messaging.",
    ),
    (
        "executive",
        "Write for executives. Emphasize outcomes, risks, decisions that need sign-off, \
and business impact.",
    ),
    (
        "support",
        "Write for a customer support team. Emphasize user-reported problems, workarounds, \
and issues needing escalation.",
    ),
];

pub(super) const LENGTHS: &[(&str, &str)] = &[
    ("brief", "Keep it to three to five bullet points."),
    (
        "detailed",
        "Use short sections with bullet points, covering every significant topic.",
    ),
    (
        "comprehensive",
        "Be thorough: cover every topic, include context and supporting details, \
and list all action items and open questions.",
    ),
];

/// Render the hierarchical template for one perspective/length pair.
pub(super) fn hierarchical(perspective_guidance: &str, length_guidance: &str) -> String {
    format!(
        "You are summarizing {{message_count}} messages from a {{category}} conversation.\n\n\
{perspective_guidance}\n\n\
{length_guidance}\n\n\
Capture decisions and action items with their owners. \
Do not include information that is not in the messages."
    )
}
