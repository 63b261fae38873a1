//! The automated SDR workflow: three sales writers, a manager that picks the
//! best draft, and an email manager that writes a subject, renders HTML and
//! sends the result.

use std::sync::Arc;

use tracing::Instrument;

use super::{Agent, RunResult, Runner};
use crate::email::EmailSender;
use crate::error::Result;
use crate::tools::SendHtmlEmailTool;

/// Default model for every agent in the workflow.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Workflow name used for the trace span.
pub const WORKFLOW_NAME: &str = "Automated SDR";

pub const PROFESSIONAL_INSTRUCTIONS: &str = "You are a sales agent working for idare.ai, \
a company that provides zero-code predictive analytics solution powered by AI. \
You write professional, serious cold emails.";

pub const WITTY_INSTRUCTIONS: &str = "You are a humorous, engaging sales agent working for idare.ai, \
a company that provides zero-code predictive analytics solution, powered by AI. \
You write witty, engaging cold emails that are likely to get a response.";

pub const BUSY_INSTRUCTIONS: &str = "You are a busy sales agent working for idare.ai, \
a company that provides zero-code predictive analytics solution, powered by AI. \
You write concise, to the point cold emails.";

pub const SUBJECT_INSTRUCTIONS: &str = "You can write a subject for a cold sales email. \
You are given a message and you need to write a subject for an email that is likely to get a response.";

pub const HTML_INSTRUCTIONS: &str = "You can convert a text email body to an HTML email body. \
You are given a text email body which might have some markdown \
and you need to convert it to an HTML email body with simple, clear, compelling layout and design.";

pub const SALES_MANAGER_INSTRUCTIONS: &str = "\
You are a Sales Manager at idare.ai. Your goal is to find the single best cold sales email using the sales tools.

Follow these steps carefully:
1. Generate Drafts: Use all three sales tools (prof_sales_agent, witty_sales_agent, busy_sales_agent) to generate \
three different email drafts. Do not proceed until all three drafts are ready.

2. Evaluate and Select: Review the drafts and choose the single best email using your judgment of which one is most \
effective.

3. Handoff for Sending: Pass ONLY the winning email draft to the 'Email Manager' agent. The Email Manager will take \
care of formatting and sending.

Crucial Rules:
- You must use the sales agent tools to generate the drafts. Do not write them yourself.
- You must hand off exactly ONE email to the Email Manager, never more than one.
";

pub const EMAIL_MANAGER_INSTRUCTIONS: &str = "You are an email formatter and sender. \
You receive the body of an email to be sent. \
You first use the subject_writer tool to write a subject for the email, then use the html_converter tool to convert \
the body to HTML. \
Finally, you use the send_html_email tool to send the email with the subject and HTML body.";

/// The fixed instruction the workflow runs on.
pub const DEFAULT_PROMPT: &str = "Send out a cold sales email addressed to Dear CTO Dr. Khairul Chowdhury \
from Kawsar, Data Scientist at idare.ai";

const SALES_TOOL_DESCRIPTION: &str = "Write a cold sales email";

/// Fixed sender/recipient pair for the outgoing email.
#[derive(Debug, Clone)]
pub struct Mailbox {
    pub sender: String,
    pub recipient: String,
}

/// Build the "Sales Manager" agent with its tools and handoff wired in.
///
/// The writer, subject and HTML agents run as tools on `runner`.
pub fn build_sales_manager(
    runner: &Runner,
    email_sender: Arc<dyn EmailSender>,
    mailbox: &Mailbox,
    model: &str,
) -> Arc<Agent> {
    let writer = |name: &str, instructions: &str| {
        Arc::new(Agent::new(name, instructions).with_model(model))
    };

    let professional = writer("Professional Sales Agent", PROFESSIONAL_INSTRUCTIONS);
    let witty = writer("Engaging Sales Agent", WITTY_INSTRUCTIONS);
    let busy = writer("Busy Sales Agent", BUSY_INSTRUCTIONS);
    let subject_writer = writer("Email subject writer", SUBJECT_INSTRUCTIONS);
    let html_converter = writer("HTML email body converter", HTML_INSTRUCTIONS);

    let send_tool = Arc::new(SendHtmlEmailTool::new(
        email_sender,
        mailbox.sender.clone(),
        mailbox.recipient.clone(),
    ));

    let emailer = Arc::new(
        Agent::new("Email Manager", EMAIL_MANAGER_INSTRUCTIONS)
            .with_model(model)
            .with_tool(subject_writer.as_tool(
                runner,
                "subject_writer",
                "Write a subject for a cold sales email",
            ))
            .with_tool(html_converter.as_tool(
                runner,
                "html_converter",
                "Convert a text email body to an HTML email body",
            ))
            .with_tool(send_tool)
            .with_handoff_description("Convert an email to HTML and send it"),
    );

    Arc::new(
        Agent::new("Sales Manager", SALES_MANAGER_INSTRUCTIONS)
            .with_model(model)
            .with_tool(professional.as_tool(
                runner,
                "prof_sales_agent",
                SALES_TOOL_DESCRIPTION,
            ))
            .with_tool(witty.as_tool(
                runner,
                "witty_sales_agent",
                SALES_TOOL_DESCRIPTION,
            ))
            .with_tool(busy.as_tool(
                runner,
                "busy_sales_agent",
                SALES_TOOL_DESCRIPTION,
            ))
            .with_handoff(emailer),
    )
}

/// Run the workflow once under the [`WORKFLOW_NAME`] trace span.
pub async fn run_workflow(runner: &Runner, manager: &Arc<Agent>, prompt: &str) -> Result<RunResult> {
    let span = tracing::info_span!("trace", workflow = WORKFLOW_NAME);
    runner.run(manager, prompt).instrument(span).await
}
