use dioxus::prelude::*;
use store::CategoryFilter;

use crate::components::Input;

/// Title search box and category dropdown above the note grid.
#[component]
pub fn FilterBar(
    search: String,
    category: CategoryFilter,
    on_search: EventHandler<String>,
    on_category: EventHandler<CategoryFilter>,
) -> Element {
    let current = category.as_str();
    let options = CategoryFilter::choices().map(|choice| {
        let label = match choice {
            CategoryFilter::All => "All categories",
            CategoryFilter::Only(c) => c.as_str(),
        };
        (choice.as_str(), label)
    });

    rsx! {
        div {
            class: "filter-bar",
            Input {
                class: "filter-search",
                placeholder: "Search by title...",
                value: search,
                oninput: move |evt: FormEvent| on_search.call(evt.value()),
            }
            select {
                class: "select filter-category",
                value: "{current}",
                onchange: move |evt: FormEvent| match evt.value().parse::<CategoryFilter>() {
                    Ok(choice) => on_category.call(choice),
                    Err(e) => tracing::warn!(error = %e, "ignoring unknown category choice"),
                },
                for (value, label) in options {
                    option {
                        key: "{value}",
                        value: "{value}",
                        selected: value == current,
                        "{label}"
                    }
                }
            }
        }
    }
}
