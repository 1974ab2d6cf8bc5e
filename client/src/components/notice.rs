//! Inline result line for form submissions and control actions.

use leptos::prelude::*;

/// Outcome of the last user action on a page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    #[must_use]
    pub fn from_result<T>(result: &Result<T, String>, ok_message: impl Into<String>) -> Self {
        match result {
            Ok(_) => Self::Info(ok_message.into()),
            Err(e) => Self::Error(e.clone()),
        }
    }
}

/// Renders the current notice, or nothing.
#[component]
pub fn NoticeLine(notice: RwSignal<Option<Notice>>) -> impl IntoView {
    move || {
        notice.get().map(|n| match n {
            Notice::Info(text) => view! { <p class="notice notice--info">{text}</p> }.into_any(),
            Notice::Error(text) => view! { <p class="notice notice--error" role="alert">{text}</p> }.into_any(),
        })
    }
}
