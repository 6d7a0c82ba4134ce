//! Server-rendered HTML pages for the student screens.
//!
//! Every piece of user-supplied text goes through [`escape_html`].

use std::fmt::Write;

use shared::Student;

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// URL an image reference is served from. Relative references resolve
/// against the site root.
fn image_src(image_ref: &str) -> String {
    if image_ref.starts_with("http://") || image_ref.starts_with("https://") || image_ref.starts_with('/') {
        image_ref.to_string()
    } else {
        format!("/{image_ref}")
    }
}

fn image_tag(student: &Student, class: &str) -> String {
    match &student.avatar {
        Some(image_ref) => format!(
            r#"<img class="{class}" src="{}" alt="{}">"#,
            escape_html(&image_src(image_ref)),
            escape_html(&student.name)
        ),
        None => String::new(),
    }
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{}</title>
  <style>
    body {{ font-family: sans-serif; margin: 2rem; }}
    table {{ border-collapse: collapse; }}
    th, td {{ padding: 0.4rem 0.8rem; border-bottom: 1px solid #ddd; text-align: left; }}
    img.thumb {{ width: 48px; height: 48px; object-fit: cover; }}
    img.photo {{ max-width: 240px; }}
    form.inline {{ display: inline; }}
    label {{ display: block; margin-top: 0.6rem; }}
  </style>
</head>
<body>
{}
</body>
</html>
"#,
        escape_html(title),
        body
    )
}

pub fn student_list_page(students: &[Student], search: Option<&str>) -> String {
    let search = search.unwrap_or_default();
    let mut body = String::new();

    body.push_str("<h1>Students</h1>\n");
    let _ = write!(
        body,
        r#"<form method="get" action="/">
  <input type="search" name="search" value="{}" placeholder="Search by name">
  <button type="submit">Search</button>
</form>
<p><a href="/addStudent">Add student</a></p>
"#,
        escape_html(search)
    );

    if students.is_empty() {
        body.push_str("<p>No students found.</p>\n");
        return layout("Students", &body);
    }

    body.push_str("<table>\n<tr><th></th><th>Name</th><th>Date of birth</th><th>Contact</th><th></th></tr>\n");
    for student in students {
        let _ = write!(
            body,
            r#"<tr>
  <td>{image}</td>
  <td><a href="/student/{id}">{name}</a></td>
  <td>{dob}</td>
  <td>{contact}</td>
  <td>
    <a href="/editStudent/{id}">Edit</a>
    <form class="inline" method="post" action="/deleteStudent/{id}">
      <button type="submit">Delete</button>
    </form>
  </td>
</tr>
"#,
            image = image_tag(student, "thumb"),
            id = student.student_id,
            name = escape_html(&student.name),
            dob = escape_html(&student.dob),
            contact = escape_html(&student.contact),
        );
    }
    body.push_str("</table>\n");

    layout("Students", &body)
}

pub fn student_detail_page(student: &Student) -> String {
    let body = format!(
        r#"<h1>{name}</h1>
{image}
<dl>
  <dt>Student ID</dt><dd>{id}</dd>
  <dt>Date of birth</dt><dd>{dob}</dd>
  <dt>Contact</dt><dd>{contact}</dd>
</dl>
<p><a href="/editStudent/{id}">Edit</a> | <a href="/">Back to list</a></p>
"#,
        name = escape_html(&student.name),
        image = image_tag(student, "photo"),
        id = student.student_id,
        dob = escape_html(&student.dob),
        contact = escape_html(&student.contact),
    );

    layout(&student.name, &body)
}

fn student_form(action: &str, submit_label: &str, student: Option<&Student>) -> String {
    let name = student.map(|s| escape_html(&s.name)).unwrap_or_default();
    let dob = student.map(|s| escape_html(&s.dob)).unwrap_or_default();
    let contact = student.map(|s| escape_html(&s.contact)).unwrap_or_default();

    format!(
        r#"<form method="post" action="{action}" enctype="multipart/form-data">
  <label>Name <input type="text" name="name" value="{name}" required></label>
  <label>Date of birth <input type="date" name="dob" value="{dob}" required></label>
  <label>Contact <input type="tel" name="contact" value="{contact}" required></label>
  <label>Image <input type="file" name="image" accept="image/*"></label>
  <p><button type="submit">{submit_label}</button> <a href="/">Cancel</a></p>
</form>
"#,
        action = escape_html(action),
    )
}

pub fn add_student_page() -> String {
    let body = format!("<h1>Add student</h1>\n{}", student_form("/addStudent", "Add", None));
    layout("Add student", &body)
}

pub fn edit_student_page(student: &Student) -> String {
    let action = format!("/editStudent/{}", student.student_id);
    let body = format!(
        "<h1>Edit {}</h1>\n{}\n{}",
        escape_html(&student.name),
        image_tag(student, "photo"),
        student_form(&action, "Save", Some(student))
    );
    layout("Edit student", &body)
}
