//! HTML pages.

use maud::{html, Markup, DOCTYPE};

use crate::person::{Person, PersonFields};
use crate::registration::{RegisterForm, Registration};

const STYLE: &str = "body{font-family:sans-serif;max-width:40rem;margin:2rem auto;padding:0 1rem}\
label{display:block;margin-top:.75rem}input{width:100%;padding:.4rem}\
button{margin-top:1rem;padding:.5rem 1rem}.error{color:#b00020}\
table{border-collapse:collapse}th{text-align:left;padding-right:1rem}";

/// Form name, label and value of each editable field, in display order.
fn field_rows(fields: &PersonFields) -> [(&'static str, &'static str, &str); 8] {
    [
        ("name", "Name", fields.name.as_str()),
        ("company", "Company", fields.company.as_str()),
        ("department", "Department", fields.department.as_str()),
        ("emergency_contact", "Emergency Contact", fields.emergency_contact.as_str()),
        ("site_incharge", "Site In-charge", fields.site_incharge.as_str()),
        ("blood_group", "Blood Group", fields.blood_group.as_str()),
        ("last_training_name", "Last Training", fields.last_training_name.as_str()),
        (
            "last_training_attended",
            "Last Training Attended",
            fields.last_training_attended.as_str(),
        ),
    ]
}

fn layout(title: &str, body: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                style { (STYLE) }
            }
            body {
                h1 { (title) }
                (body)
            }
        }
    }
}

/// Gatepass number entry form, with an optional validation message.
#[must_use]
pub fn start_page(error: Option<&str>) -> Markup {
    layout(
        "Gatepass Registration",
        &html! {
            @if let Some(error) = error {
                p.error { (error) }
            }
            form method="post" action="/start" {
                label for="gatepass_number" { "Gatepass Number" }
                input id="gatepass_number" type="text" name="gatepass_number" autofocus;
                button type="submit" { "Continue" }
            }
        },
    )
}

/// Profile form for one gatepass number, pre-filled when the record exists.
#[must_use]
pub fn register_page(form: &RegisterForm) -> Markup {
    let fields = form.fields();
    let title = if form.person.is_some() {
        "Update Registration"
    } else {
        "New Registration"
    };
    layout(
        title,
        &html! {
            p { "Gatepass Number: " strong { (form.gatepass_number) } }
            form method="post" {
                @for (name, label, value) in field_rows(&fields) {
                    label for=(name) { (label) }
                    input id=(name) type="text" name=(name) value=(value);
                }
                button type="submit" { "Save" }
            }
        },
    )
}

/// Confirmation with the QR image and the profile link.
#[must_use]
pub fn confirmation_page(registration: &Registration) -> Markup {
    layout(
        "QR Code Generated",
        &html! {
            p { "Gatepass Number: " strong { (registration.person.gatepass_number) } }
            img src=(registration.qr_url) alt=(registration.qr_filename);
            p {
                "Profile: "
                a href=(registration.profile_url) { (registration.profile_url) }
            }
            p { a href="/start" { "Register another" } }
        },
    )
}

/// Full record view.
#[must_use]
pub fn profile_page(person: &Person) -> Markup {
    layout(
        &person.fields.name,
        &html! {
            table {
                tr { th { "Gatepass Number" } td { (person.gatepass_number) } }
                @for (_, label, value) in field_rows(&person.fields) {
                    tr { th { (label) } td { (value) } }
                }
            }
        },
    )
}
