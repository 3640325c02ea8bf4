use std::fmt::Write;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use crate::auth::Authenticated;
use crate::models::Todo;
use crate::services::ViewState;

const HEAD: &str = "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>My todos App</title></head>\n<body>\n";
const TAIL: &str = "</body>\n</html>\n";

/// Renders the whole page. Requires a signed-in user.
pub fn page(state: &ViewState, user: &Authenticated) -> String {
    let mut html = String::from(HEAD);
    html.push_str("<div class=\"App\">\n<h1>My todos App</h1>\n");

    // One form keeps the typed name and description when a file is uploaded.
    // Upload posts it as multipart to /upload, Create as urlencoded to /todos.
    let _ = write!(
        html,
        "<form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\n\
         <input name=\"name\" placeholder=\"Todo name\" value=\"{}\">\n\
         <input name=\"description\" placeholder=\"Todo description\" value=\"{}\">\n\
         <input type=\"file\" name=\"file\">\n\
         <button type=\"submit\" formaction=\"/todos\" formenctype=\"application/x-www-form-urlencoded\">Create todo</button>\n\
         <button type=\"submit\">Upload</button>\n\
         </form>\n",
        escape_html(&state.form_data.name),
        escape_html(&state.form_data.description),
    );

    if let Some(key) = state.form_data.stored_image_key() {
        let _ = writeln!(html, "<p class=\"attached\">Attached: {}</p>", escape_html(key));
    }

    html.push_str("<div style=\"margin-bottom: 30px\">\n");
    for todo in &state.todos {
        todo_item(&mut html, todo);
    }
    html.push_str("</div>\n");

    let _ = write!(
        html,
        "<form method=\"post\" action=\"/sign-out\">\n\
         <span>Signed in as {}</span>\n\
         <button type=\"submit\">Sign Out</button>\n\
         </form>\n",
        escape_html(user.username()),
    );

    html.push_str("</div>\n");
    html.push_str(TAIL);
    html
}

/// Shown instead of the page while nobody is signed in.
pub fn sign_in_page() -> String {
    let mut html = String::from(HEAD);
    html.push_str(
        "<div class=\"App\">\n<h1>Sign in</h1>\n\
         <form method=\"post\" action=\"/sign-in\">\n\
         <input name=\"username\" placeholder=\"Username\">\n\
         <input name=\"id_token\" placeholder=\"ID token\">\n\
         <button type=\"submit\">Sign In</button>\n\
         </form>\n</div>\n",
    );
    html.push_str(TAIL);
    html
}

fn todo_item(html: &mut String, todo: &Todo) {
    let _ = writeln!(html, "<div data-key=\"{}\">", escape_html(todo.display_key()));
    let _ = writeln!(html, "<h2>{}</h2>", escape_html(&todo.name));
    let _ = writeln!(html, "<p>{}</p>", escape_html(&todo.description));

    match &todo.id {
        Some(id) => {
            let _ = writeln!(
                html,
                "<form method=\"post\" action=\"/todos/{}/delete\"><button type=\"submit\">Delete todo</button></form>",
                escape_path_segment(id),
            );
        }
        // Not reloaded yet, so there is no record id to delete by.
        None => html.push_str("<button type=\"button\" disabled>Delete todo</button>\n"),
    }

    if let Some(url) = &todo.image_url {
        let _ = writeln!(
            html,
            "<img src=\"{}\" style=\"width: 400px\" alt=\"{}\">",
            escape_html(url),
            escape_html(&todo.description),
        );
    }
    html.push_str("</div>\n");
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn escape_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, NON_ALPHANUMERIC).to_string()
}
