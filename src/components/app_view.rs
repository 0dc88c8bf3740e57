//! Routes of the site.

use dioxus::prelude::*;

use crate::components::views::{Dashboard, Home};
use crate::components::AppShell;

#[derive(Routable, Clone, PartialEq, Debug)]
#[rustfmt::skip]
pub enum AppView {
    #[layout(AppShell)]
        #[route("/")]
        Home {},
        /// Unlisted; reached by typing the URL.
        #[route("/dashboard")]
        Dashboard {},
}

pub fn view_label(view: &AppView) -> &'static str {
    match view {
        AppView::Home {} => "Home",
        AppView::Dashboard {} => "Visitor Dashboard",
    }
}
