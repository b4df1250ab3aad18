//! Submission side of the portfolio contact form.
//!
//! [`ContactForm`] holds the draft the visitor is typing, relays it through a
//! [`ContactApi`] and reports the outcome to a [`Notifier`] such as [`Toast`].

pub use api::{ContactApi, ContactApiError, ContactPayload, ContactReply, HttpContactApi};
pub use form::{
    ContactDraft, ContactForm, DraftField, FormState, Notification, NotificationKind, Notifier,
    SubmitOutcome,
};
pub use toast::{Toast, ToastState};

pub mod api;
pub mod form;
pub mod http;
pub mod toast;
