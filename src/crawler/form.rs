//! Named-form discovery and submission
//!
//! Builds the request a browser would send when submitting a `<form name="...">`
//! found on a fetched page: the form's own successful controls, with selected
//! fields overridden by the caller.

use crate::crawler::fetcher::{Page, PageRequest};
use crate::extract::{selector, ExtractionError};
use reqwest::Method;
use scraper::{ElementRef, Html};
use url::Url;

/// Input types that never contribute a value to a submission
const SKIPPED_INPUT_TYPES: [&str; 5] = ["submit", "button", "reset", "image", "file"];

/// A form ready to be submitted
#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmission {
    /// Resolved `action` URL
    pub action: Url,

    /// `GET` or `POST`
    pub method: Method,

    /// Field name/value pairs in document order
    pub fields: Vec<(String, String)>,
}

impl FormSubmission {
    /// Finds `<form name="{form_name}">` on `page` and fills it in
    ///
    /// An empty or missing `action` submits back to the page's own URL. Each entry in
    /// `overrides` replaces the form's value for that name, or is appended when the
    /// form has no such field.
    ///
    /// # Errors
    ///
    /// * `ExtractionError::FormNotFound` - no form with that name on the page
    /// * `ExtractionError::InvalidUrl` - the `action` cannot be resolved
    pub fn from_page(
        page: &Page,
        form_name: &str,
        overrides: &[(&str, &str)],
    ) -> Result<Self, ExtractionError> {
        let document = Html::parse_document(&page.body);
        let form_selector = selector("form")?;

        let form = document
            .select(&form_selector)
            .find(|form| form.value().attr("name") == Some(form_name))
            .ok_or_else(|| ExtractionError::FormNotFound {
                name: form_name.to_string(),
            })?;

        let action = match form.value().attr("action").map(str::trim) {
            Some(action) if !action.is_empty() => page.url.join(action).map_err(|e| {
                ExtractionError::InvalidUrl {
                    url: action.to_string(),
                    message: e.to_string(),
                }
            })?,
            _ => page.url.clone(),
        };

        let method = match form.value().attr("method") {
            Some(m) if m.eq_ignore_ascii_case("post") => Method::POST,
            _ => Method::GET,
        };

        let mut fields = successful_controls(form)?;
        for (name, value) in overrides {
            match fields.iter_mut().find(|(existing, _)| existing == name) {
                Some(field) => field.1 = value.to_string(),
                None => fields.push((name.to_string(), value.to_string())),
            }
        }

        Ok(Self {
            action,
            method,
            fields,
        })
    }

    /// Converts the submission into a request
    pub fn into_request(self) -> PageRequest {
        if self.method == Method::POST {
            PageRequest::post_form(self.action, self.fields)
        } else {
            let mut url = self.action;
            url.query_pairs_mut().extend_pairs(self.fields.iter());
            PageRequest::get(url)
        }
    }

    /// Returns the submitted value of `name`, if any
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Collects the name/value pairs a browser would submit for `form`
fn successful_controls(form: ElementRef<'_>) -> Result<Vec<(String, String)>, ExtractionError> {
    let controls = selector("input[name], select[name], textarea[name]")?;
    let option = selector("option")?;
    let mut fields = Vec::new();

    for control in form.select(&controls) {
        let element = control.value();
        if element.attr("disabled").is_some() {
            continue;
        }
        let Some(name) = element.attr("name") else {
            continue;
        };

        match element.name() {
            "input" => {
                let kind = element.attr("type").unwrap_or("text").to_ascii_lowercase();
                if SKIPPED_INPUT_TYPES.contains(&kind.as_str()) {
                    continue;
                }
                if (kind == "checkbox" || kind == "radio") && element.attr("checked").is_none() {
                    continue;
                }
                let default = if kind == "checkbox" || kind == "radio" {
                    "on"
                } else {
                    ""
                };
                let value = element.attr("value").unwrap_or(default);
                fields.push((name.to_string(), value.to_string()));
            }
            "select" => {
                let options: Vec<ElementRef<'_>> = control.select(&option).collect();
                let chosen = options
                    .iter()
                    .find(|o| o.value().attr("selected").is_some())
                    .or_else(|| options.first());
                if let Some(chosen) = chosen {
                    let value = chosen
                        .value()
                        .attr("value")
                        .map(str::to_string)
                        .unwrap_or_else(|| chosen.text().collect::<String>().trim().to_string());
                    fields.push((name.to_string(), value));
                }
            }
            "textarea" => {
                fields.push((name.to_string(), control.text().collect::<String>()));
            }
            _ => {}
        }
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, body: &str) -> Page {
        let url = Url::parse(url).unwrap();
        Page {
            request_url: url.clone(),
            url,
            status_code: 200,
            request_authorization: None,
            body: body.to_string(),
        }
    }

    const ENTRY_FORM: &str = r#"
        <html><body>
        <form name="search" action="/search"><input name="q" value=""></form>
        <form name="entry_form" method="post" action="/giveaway/enter/55">
            <input type="hidden" name="authenticity_token" value="stale">
            <input type="hidden" name="utf8" value="&#x2713;">
            <input type="checkbox" name="entry_terms" value="1">
            <input type="checkbox" name="want_to_read" value="1" checked>
            <input type="radio" name="shelf" value="a">
            <input type="radio" name="shelf" value="b" checked>
            <select name="country">
                <option value="US">United States</option>
                <option value="CA" selected>Canada</option>
            </select>
            <textarea name="note">hello</textarea>
            <input type="text" name="disabled_field" value="x" disabled>
            <input type="submit" name="commit" value="Enter Giveaway">
        </form>
        </body></html>
    "#;

    #[test]
    fn test_finds_named_form() {
        let page = page("https://example.com/giveaway/enter_print_giveaway/55", ENTRY_FORM);
        let form = FormSubmission::from_page(&page, "entry_form", &[]).unwrap();

        assert_eq!(form.method, Method::POST);
        assert_eq!(form.action.as_str(), "https://example.com/giveaway/enter/55");
        assert_eq!(
            form.fields,
            vec![
                ("authenticity_token".to_string(), "stale".to_string()),
                ("utf8".to_string(), "\u{2713}".to_string()),
                ("want_to_read".to_string(), "1".to_string()),
                ("shelf".to_string(), "b".to_string()),
                ("country".to_string(), "CA".to_string()),
                ("note".to_string(), "hello".to_string()),
            ]
        );
    }

    #[test]
    fn test_overrides_replace_and_append() {
        let page = page("https://example.com/giveaway/enter_print_giveaway/55", ENTRY_FORM);
        let form = FormSubmission::from_page(
            &page,
            "entry_form",
            &[
                ("authenticity_token", "fresh"),
                ("want_to_read", "0"),
                ("entry_terms", "1"),
                ("commit", "Enter Giveaway"),
            ],
        )
        .unwrap();

        assert_eq!(form.field("authenticity_token"), Some("fresh"));
        assert_eq!(form.field("want_to_read"), Some("0"));
        assert_eq!(form.field("entry_terms"), Some("1"));
        assert_eq!(form.field("commit"), Some("Enter Giveaway"));
        assert_eq!(
            form.fields.iter().filter(|(n, _)| n == "authenticity_token").count(),
            1
        );
    }

    #[test]
    fn test_missing_form() {
        let page = page("https://example.com/", "<html><body></body></html>");
        let result = FormSubmission::from_page(&page, "entry_form", &[]);
        assert_eq!(
            result,
            Err(ExtractionError::FormNotFound {
                name: "entry_form".to_string()
            })
        );
    }

    #[test]
    fn test_empty_action_posts_back_to_page() {
        let page = page(
            "https://example.com/ap/signin?x=1",
            r#"<form name="signIn" method="POST" action=""><input name="email"></form>"#,
        );
        let form = FormSubmission::from_page(&page, "signIn", &[("email", "a@b.c")]).unwrap();
        assert_eq!(form.action.as_str(), "https://example.com/ap/signin?x=1");
        assert_eq!(form.method, Method::POST);
    }

    #[test]
    fn test_get_form_into_request() {
        let page = page("https://example.com/", ENTRY_FORM);
        let form = FormSubmission::from_page(&page, "search", &[("q", "dune")]).unwrap();
        let request = form.into_request();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url.as_str(), "https://example.com/search?q=dune");
    }
}
