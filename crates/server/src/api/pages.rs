//! Server-rendered HTML for the mashup form.

use crate::form::{MashupForm, DEFAULT_CLIP_DURATION, DEFAULT_VIDEO_COUNT};
use mashup_core::request::{MIN_CLIP_SECONDS, MIN_VIDEO_COUNT};

const STYLE: &str = "body{font-family:sans-serif;max-width:36rem;margin:2rem auto;padding:0 1rem}\
label{display:block;margin-top:1rem}input{width:100%;padding:.4rem}\
button{margin-top:1.5rem;padding:.5rem 1.5rem}\
.banner{padding:.75rem 1rem;border-radius:4px;margin:1rem 0}\
.error{background:#fde2e1;color:#8a1c16}.success{background:#e1f5e4;color:#1d5e2a}";

/// Minimal HTML escaping for text and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Mashup Generator</title>\n<style>{STYLE}</style>\n</head>\n\
         <body>\n<h1>Mashup Generator</h1>\n{body}\n</body>\n</html>\n"
    )
}

fn error_banner(messages: &[String]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let items: String = messages
        .iter()
        .map(|m| format!("<li>{}</li>", escape_html(m)))
        .collect();
    format!("<div class=\"banner error\"><ul>{items}</ul></div>")
}

fn field_or(value: &str, default: u32) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        escape_html(value)
    }
}

/// The form, pre-filled with `values` and topped by any `errors`.
pub fn form_page(values: &MashupForm, errors: &[String]) -> String {
    let body = format!(
        "{banner}\n<form method=\"post\" action=\"/mashup\">\n\
         <label for=\"singer\">Singer name</label>\n\
         <input id=\"singer\" name=\"singer\" type=\"text\" value=\"{singer}\">\n\
         <label for=\"video_count\">Number of videos</label>\n\
         <input id=\"video_count\" name=\"video_count\" type=\"number\" min=\"{min_videos}\" value=\"{videos}\">\n\
         <label for=\"clip_duration\">Duration of each clip (seconds)</label>\n\
         <input id=\"clip_duration\" name=\"clip_duration\" type=\"number\" min=\"{min_clip}\" value=\"{clip}\">\n\
         <label for=\"email\">Email</label>\n\
         <input id=\"email\" name=\"email\" type=\"email\" value=\"{email}\">\n\
         <button type=\"submit\">Create mashup</button>\n</form>",
        banner = error_banner(errors),
        singer = escape_html(&values.singer),
        min_videos = MIN_VIDEO_COUNT + 1,
        videos = field_or(&values.video_count, DEFAULT_VIDEO_COUNT),
        min_clip = MIN_CLIP_SECONDS + 1,
        clip = field_or(&values.clip_duration, DEFAULT_CLIP_DURATION),
        email = escape_html(&values.email),
    );
    layout(&body)
}

pub fn success_page(email: &str) -> String {
    layout(&format!(
        "<div class=\"banner success\">Mashup created and sent to {}.</div>\n\
         <p><a href=\"/\">Create another</a></p>",
        escape_html(email)
    ))
}

/// The form again, with a single failure banner.
pub fn failure_page(values: &MashupForm, message: &str) -> String {
    form_page(values, &[message.to_string()])
}
