//! Server-rendered dashboard pages.

use crate::domains::chatbot::Chatbot;
use crate::domains::conversation::ConversationTurn;
use crate::domains::user::User;
use crate::editor::{BotEditor, Notice, NoticeLevel};
use crate::embed::EmbedSnippets;
use crate::services::fetch::ResourceState;
use crate::time_format::format_turn_time;

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn layout(title: &str, notices: &[Notice], body: &str) -> String {
    let notices_html: String = notices
        .iter()
        .map(|notice| {
            let class = match notice.level {
                NoticeLevel::Success => "notice notice-success",
                NoticeLevel::Error => "notice notice-error",
            };
            format!(
                r#"<div class="{class}" role="status">{}</div>"#,
                html_escape(&notice.message)
            )
        })
        .collect();
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<nav><a href="/chatbot">Chatbots</a> | <a href="/conversations">Conversations</a> | <a href="/signout">Sign out</a></nav>
<section>
<h1>{title}</h1>
{notices_html}
{body}
</section>
</body>
</html>"##,
        title = html_escape(title),
    )
}

/// Loading / error fallbacks shared by every list page. `None` means the
/// rows are ready to render.
fn fallback<T>(state: &ResourceState<T>) -> Option<String> {
    if let Some(error) = &state.error {
        return Some(format!(
            r#"<div class="error">{}</div>"#,
            html_escape(error)
        ));
    }
    if state.loading || state.data.is_none() {
        return Some(r#"<div class="loading">Loading…</div>"#.to_string());
    }
    None
}

pub fn sign_in_page(action: &str, error: Option<&str>) -> String {
    let error_html = error
        .map(|message| format!(r#"<div class="error">{}</div>"#, html_escape(message)))
        .unwrap_or_default();
    let body = format!(
        r#"{error_html}
<form method="post" action="{action}">
<label for="email">Email</label>
<input id="email" name="email" type="email" required>
<label for="password">Password</label>
<input id="password" name="password" type="password" required>
<button type="submit">Sign in</button>
</form>"#,
        action = html_escape(action),
    );
    layout("Sign in", &[], &body)
}

pub fn bot_list_page(
    bots: &ResourceState<Chatbot>,
    user: Option<&User>,
    notices: &[Notice],
) -> String {
    let account = match user {
        Some(user) => format!(
            r#"<p>Signed in as {}</p>
<form method="post" action="/account/name">
<label for="full_name">Your name</label>
<input id="full_name" name="full_name" value="{}" maxlength="64">
<button type="submit">Save</button>
</form>"#,
            html_escape(user.display_name()),
            html_escape(user.full_name.as_deref().unwrap_or_default())
        ),
        None => String::new(),
    };

    let create = r#"<form method="post" action="/chatbot">
<label for="name">Chatbot name</label>
<input id="name" name="name" required>
<label for="about_us">About business</label>
<textarea id="about_us" name="about_us"></textarea>
<button type="submit">Create Chatbot</button>
</form>"#;

    let table = fallback(bots).unwrap_or_else(|| {
        let rows = bots.data.as_deref().unwrap_or_default();
        if rows.is_empty() {
            return "<p>No data found</p>".to_string();
        }
        let rows: String = rows
            .iter()
            .map(|bot| {
                let id = html_escape(&bot.id);
                format!(
                    r#"<tr><td>{name}</td><td>{business}</td><td><a href="/chatbot/prompt/{id}">Edit</a> <a href="/chatbot/conversation/{id}">Conversations</a> <a href="/chatbot/embedding/{id}">Embed</a></td></tr>"#,
                    name = html_escape(&bot.name),
                    business = html_escape(&bot.business_name),
                )
            })
            .collect();
        format!(
            "<table>\n<thead><tr><th>Name</th><th>Business</th><th></th></tr></thead>\n<tbody>{rows}</tbody>\n</table>"
        )
    });

    layout(
        "Chatbots",
        notices,
        &format!("{account}\n{create}\n{table}"),
    )
}

pub fn conversation_page(title: &str, turns: &ResourceState<ConversationTurn>) -> String {
    let body = fallback(turns).unwrap_or_else(|| {
        let turns = turns.data.as_deref().unwrap_or_default();
        if turns.is_empty() {
            return "<p>No data found</p>".to_string();
        }
        let rows: String = turns
            .iter()
            .map(|turn| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    html_escape(&turn.id),
                    html_escape(&turn.chatbot_id),
                    html_escape(&format_turn_time(&turn.created_at)),
                    html_escape(&turn.user_question),
                    html_escape(&turn.bot_answer),
                )
            })
            .collect();
        format!(
            "<table>\n<thead><tr><th>Id</th><th>Chatbot Id</th><th>Time</th><th>Question</th><th>Bot answer</th></tr></thead>\n<tbody>{rows}</tbody>\n</table>"
        )
    });
    layout(title, &[], &body)
}

pub fn embed_page(snippets: &EmbedSnippets) -> String {
    let body = format!(
        r#"<p>To add the chatbot anywhere on your website, add this iframe to your html code</p>
<pre><code>{}</code></pre>
<p>To add the chatbot as a bubble and popup on your website add this script to your html code</p>
<pre><code>{}</code></pre>"#,
        html_escape(&snippets.iframe),
        html_escape(&snippets.script),
    );
    layout("Embed on website", &[], &body)
}

pub fn error_page(title: &str, message: &str) -> String {
    layout(
        title,
        &[],
        &format!(r#"<div class="error">{}</div>"#, html_escape(message)),
    )
}

/// Posts `drop:{from}:{to}` when a question is dropped on another one, and
/// `drop:{from}:` when it is dropped outside the list.
const DRAG_REORDER_SCRIPT: &str = r#"<script>
(function () {
  var form = document.getElementById("bot-form");
  var from = null;
  var dropped = false;
  function submitDrop(value) {
    var input = document.createElement("input");
    input.type = "hidden";
    input.name = "action";
    input.value = value;
    form.appendChild(input);
    form.submit();
  }
  form.querySelectorAll(".question").forEach(function (row) {
    row.addEventListener("dragstart", function () {
      from = row.dataset.index;
      dropped = false;
    });
    row.addEventListener("dragover", function (event) {
      event.preventDefault();
    });
    row.addEventListener("drop", function (event) {
      event.preventDefault();
      dropped = true;
      submitDrop("drop:" + from + ":" + row.dataset.index);
    });
    row.addEventListener("dragend", function () {
      if (!dropped && from !== null) {
        submitDrop("drop:" + from + ":");
      }
    });
  });
})();
</script>"#;

pub fn editor_page(editor: &BotEditor, preview_src: &str, notices: &[Notice]) -> String {
    let form = editor.form();
    let id = html_escape(editor.chatbot_id());
    let last = form.questions.len().saturating_sub(1);
    let questions: String = form
        .questions
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let key = html_escape(entry.key());
            let up = if index > 0 {
                format!(r#"<button type="submit" name="action" value="up:{key}">Up</button>"#)
            } else {
                String::new()
            };
            let down = if index < last {
                format!(r#"<button type="submit" name="action" value="down:{key}">Down</button>"#)
            } else {
                String::new()
            };
            format!(
                r#"<div class="question" draggable="true" data-index="{index}" data-key="{key}">
<span class="drag-handle" title="Drag to reorder">&#8801;</span>
<label for="question.{key}">Question {number}</label>
<textarea id="question.{key}" name="question.{key}">{text}</textarea>
{up}{down}<button type="submit" name="action" value="remove:{key}">Delete</button>
</div>"#,
                number = index + 1,
                text = html_escape(&entry.question),
            )
        })
        .collect();

    let body = format!(
        r#"<form id="bot-form" method="post" action="/chatbot/prompt/{id}">
<label for="name">Chat bot Name</label>
<input id="name" name="name" value="{name}">
<label for="business_name">Business Name</label>
<input id="business_name" name="business_name" value="{business}">
<label for="about_us">About business</label>
<textarea id="about_us" name="about_us">{about}</textarea>
{questions}
<button type="submit" name="action" value="append">Add Question</button>
<button type="submit" name="action" value="save">Save</button>
</form>
<iframe width="100%" height="700px" src="{preview}"></iframe>
{script}"#,
        name = html_escape(&form.name),
        business = html_escape(&form.business_name),
        about = html_escape(&form.about_us),
        preview = html_escape(preview_src),
        script = DRAG_REORDER_SCRIPT,
    );
    layout("Chatbot details", notices, &body)
}
