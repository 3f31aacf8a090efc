use std::time::Duration;

use leptos::prelude::*;
use leptos::task::spawn_local;
use overlay_engine::palette::LEGEND;
use overlay_engine::{export_file_name, export_json, export_summary, Detection, DetectionStats};
use tracing::warn;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// Heading above the viewer for the active filter.
pub fn view_title(selected: Option<&str>) -> String {
    match selected {
        Some(label) => {
            let mut chars = label.chars();
            match chars.next() {
                Some(first) => format!("{}{} View", first.to_uppercase(), chars.as_str()),
                None => "Full Blueprint View".to_string(),
            }
        }
        None => "Full Blueprint View".to_string(),
    }
}

/// Clicking the active label clears the filter; any other label selects it.
pub fn toggle_label(current: Option<&str>, clicked: &str) -> Option<String> {
    if current.is_some_and(|label| label.eq_ignore_ascii_case(clicked)) {
        None
    } else {
        Some(clicked.to_string())
    }
}

/// Export buttons stay disabled until there is something to export.
pub fn nothing_to_export(detections: &[Detection]) -> bool {
    detections.is_empty()
}

#[component]
pub fn LabelFilter(
    #[prop(into)] detections: Signal<Vec<Detection>>,
    selected: RwSignal<Option<String>>,
) -> impl IntoView {
    let labels = Memo::new(move |_| {
        detections.with(|list| {
            DetectionStats::from_detections(list)
                .labels()
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
    });

    view! {
        <label class="label-filter">
            "Show: "
            <select
                prop:value=move || selected.get().unwrap_or_default()
                on:change=move |ev| {
                    let value = event_target_value(&ev);
                    selected.set(if value.is_empty() { None } else { Some(value) });
                }
            >
                <option value="">"All elements"</option>
                {move || {
                    labels
                        .get()
                        .into_iter()
                        .map(|label| view! { <option value=label.clone()>{label.clone()}</option> })
                        .collect_view()
                }}
            </select>
        </label>
    }
}

#[component]
pub fn StatsPanel(
    #[prop(into)] detections: Signal<Vec<Detection>>,
    selected: RwSignal<Option<String>>,
) -> impl IntoView {
    let stats = Memo::new(move |_| detections.with(|list| DetectionStats::from_detections(list)));

    view! {
        <div class="stats-panel">
            <h3>"Detection Summary"</h3>
            <p>"Total: " {move || stats.get().total}</p>
            <p>"Average confidence: " {move || stats.get().avg_confidence_display()}</p>
            <ul class="type-breakdown">
                {move || {
                    stats
                        .get()
                        .shares()
                        .into_iter()
                        .map(|share| {
                            let label = share.label.clone();
                            let active = {
                                let label = label.clone();
                                move || selected.get().as_deref() == Some(label.as_str())
                            };
                            view! {
                                <li
                                    class:active=active
                                    on:click=move |_| {
                                        selected.update(|s| *s = toggle_label(s.as_deref(), &label));
                                    }
                                >
                                    <span class="swatch" style=format!("background: {};", share.color.to_hex())></span>
                                    {format!("{}: {} ({:.1}%)", share.label, share.count, share.percentage)}
                                </li>
                            }
                        })
                        .collect_view()
                }}
            </ul>
            <div class="legend">
                {LEGEND
                    .iter()
                    .map(|(label, color)| {
                        view! {
                            <span class="legend-item">
                                <span class="swatch" style=format!("background: {};", color.to_hex())></span>
                                {*label}
                            </span>
                        }
                    })
                    .collect_view()}
            </div>
        </div>
    }
}

fn download_json(json: &str, file_name: &str) -> Result<(), JsValue> {
    let parts = js_sys::Array::of1(&JsValue::from_str(json));
    let options = web_sys::BlobPropertyBag::new();
    options.set_type("application/json");
    let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &options)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)?;

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let anchor = document
        .create_element("a")?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|_| JsValue::from_str("anchor element expected"))?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();

    web_sys::Url::revoke_object_url(&url)
}

async fn copy_to_clipboard(text: String) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let promise = window.navigator().clipboard().write_text(&text);
    JsFuture::from(promise).await?;
    Ok(())
}

#[component]
pub fn ExportPanel(
    #[prop(into)] detections: Signal<Vec<Detection>>,
    #[prop(into)] blueprint_id: Signal<Option<String>>,
) -> impl IntoView {
    let copied = RwSignal::new(false);
    let error = RwSignal::new(Option::<String>::None);

    let serialise = move || detections.with(|list| export_json(list));

    let on_download = move |_| match serialise() {
        Ok(json) => {
            let name = export_file_name(blueprint_id.get_untracked().as_deref());
            if let Err(e) = download_json(&json, &name) {
                warn!("Download failed: {:?}", e);
                error.set(Some("Download failed".to_string()));
            }
        }
        Err(e) => error.set(Some(e.to_string())),
    };

    let on_copy = move |_| match serialise() {
        Ok(json) => spawn_local(async move {
            match copy_to_clipboard(json).await {
                Ok(()) => {
                    error.set(None);
                    copied.set(true);
                    set_timeout(move || copied.set(false), Duration::from_secs(2));
                }
                Err(e) => {
                    warn!("Clipboard write failed: {:?}", e);
                    error.set(Some("Could not copy to clipboard".to_string()));
                }
            }
        }),
        Err(e) => error.set(Some(e.to_string())),
    };

    view! {
        <div class="export-panel">
            <h3>"Export"</h3>
            <p>{move || detections.with(|list| export_summary(list.len()))}</p>
            <button on:click=on_download disabled=move || detections.with(|list| nothing_to_export(list))>
                "Download JSON"
            </button>
            <button on:click=on_copy disabled=move || detections.with(|list| nothing_to_export(list))>
                {move || if copied.get() { "Copied!" } else { "Copy to Clipboard" }}
            </button>
            {move || error.get().map(|e| view! { <p class="error">{e}</p> })}
        </div>
    }
}
