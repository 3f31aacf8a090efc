use detection_client::{fetch_detections, DetectionService, HttpDetectionService};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::*;
use overlay_engine::{Detection, ViewerConfig};
use tracing::{error, info, warn};
use wasm_bindgen::prelude::*;

mod blueprint_viewer;
mod canvas;
mod panels;
mod upload;

use blueprint_viewer::BlueprintViewer;
use panels::{view_title, ExportPanel, LabelFilter, StatsPanel};
use upload::upload_picked_file;

/// Shown until a blueprint id is loaded.
pub fn demo_detections() -> Vec<Detection> {
    vec![
        Detection::new("wall", 0.95, [50.0, 50.0, 200.0, 10.0]),
        Detection::new("door", 0.89, [120.0, 50.0, 40.0, 60.0]),
        Detection::new("window", 0.92, [200.0, 80.0, 50.0, 40.0]),
        Detection::new("room", 0.87, [50.0, 50.0, 200.0, 150.0]),
    ]
}

/// Defaults, with the service URL baked in at build time when set.
fn frontend_config() -> ViewerConfig {
    ViewerConfig::default().with_overrides(option_env!("BLUEPRINT_API_URL").map(str::to_string), None)
}

#[derive(Debug, Clone, PartialEq)]
enum FetchStatus {
    Idle,
    Loading,
    Failed(String),
}

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="Blueprint Viewer"/>
        <Dashboard/>
    }
}

#[component]
fn Dashboard() -> impl IntoView {
    let config = frontend_config();
    let service = StoredValue::new_local(match HttpDetectionService::from_config(&config) {
        Ok(service) => Some(service),
        Err(e) => {
            error!("Detection service unavailable: {}", e);
            None
        }
    });

    let id_input = RwSignal::new(String::new());
    let blueprint_id = RwSignal::new(Option::<String>::None);
    let detections = RwSignal::new(demo_detections());
    let selected = RwSignal::new(Option::<String>::None);
    let status = RwSignal::new(FetchStatus::Idle);
    let uploading = RwSignal::new(false);
    let upload_error = RwSignal::new(Option::<String>::None);
    let file_input_ref = NodeRef::<leptos::html::Input>::new();

    let fetch = move |id: String| {
        let Some(service) = service.get_value() else {
            status.set(FetchStatus::Failed("Could not reach the detection service".to_string()));
            return;
        };
        status.set(FetchStatus::Loading);
        spawn_local(async move {
            let result = fetch_detections(&service, &id).await;
            // A newer id may have been loaded while this one was in flight.
            if blueprint_id.get_untracked().as_deref() != Some(id.as_str()) {
                return;
            }
            match result {
                Ok(outcome) => {
                    info!("Loaded {} detections for {} ({:?})", outcome.detections.len(), id, outcome.source);
                    detections.set(outcome.detections);
                    status.set(FetchStatus::Idle);
                }
                Err(e) => {
                    warn!("Fetching detections for {} failed: {}", id, e);
                    status.set(FetchStatus::Failed(e.user_message()));
                }
            }
        });
    };

    let load = move |id: String| {
        selected.set(None);
        detections.set(Vec::new());
        blueprint_id.set(Some(id.clone()));
        fetch(id);
    };

    // Upload, then show the new blueprint; its results are computed on first fetch.
    let on_file_change = move |_| {
        let Some(input) = file_input_ref.get_untracked() else {
            return;
        };
        let Some(file) = input.files().and_then(|files| files.get(0)) else {
            return;
        };
        input.set_value("");
        let Some(service) = service.get_value() else {
            upload_error.set(Some("Could not reach the detection service".to_string()));
            return;
        };

        upload_error.set(None);
        uploading.set(true);
        spawn_local(async move {
            let outcome = upload_picked_file(&service, file).await;
            uploading.set(false);
            match outcome {
                Ok(id) => {
                    id_input.set(id.clone());
                    load(id);
                }
                Err(message) => {
                    warn!("Upload failed: {}", message);
                    upload_error.set(Some(message));
                }
            }
        });
    };

    let image_url = Signal::derive(move || {
        let id = blueprint_id.get()?;
        service.with_value(|s| s.as_ref().map(|s| s.blueprint_url(&id)))
    });

    view! {
        <div class="container">
            <header>
                <h1>"Blueprint Viewer"</h1>
                <form on:submit=move |ev| {
                    ev.prevent_default();
                    let id = id_input.get_untracked().trim().to_string();
                    if !id.is_empty() {
                        load(id);
                    }
                }>
                    <input
                        type="text"
                        placeholder="Blueprint ID"
                        prop:value=move || id_input.get()
                        on:input=move |ev| id_input.set(event_target_value(&ev))
                    />
                    <button type="submit">"Load"</button>
                </form>
                <label class="upload">
                    "Upload blueprint: "
                    <input
                        type="file"
                        accept="image/png,image/jpeg"
                        node_ref=file_input_ref
                        disabled=move || uploading.get()
                        on:change=on_file_change
                    />
                </label>
                {move || uploading.get().then(|| view! { <p class="loading">"Uploading..."</p> })}
                {move || upload_error.get().map(|message| view! { <p class="error">{message}</p> })}
            </header>

            {move || match status.get() {
                FetchStatus::Idle => None,
                FetchStatus::Loading => Some(view! { <p class="loading">"Loading detections..."</p> }.into_any()),
                FetchStatus::Failed(message) => Some(
                    view! {
                        <div class="error">
                            <p>{message}</p>
                            <button on:click=move |_| {
                                if let Some(id) = blueprint_id.get_untracked() {
                                    fetch(id);
                                }
                            }>"Retry"</button>
                        </div>
                    }
                    .into_any(),
                ),
            }}

            <main class="dashboard">
                <section class="viewer-panel">
                    <h2>{move || view_title(selected.get().as_deref())}</h2>
                    <LabelFilter detections=detections selected=selected/>
                    {move || {
                        blueprint_id
                            .get()
                            .is_none()
                            .then(|| view! { <p class="placeholder">"No blueprint loaded. Showing sample detections."</p> })
                    }}
                    <BlueprintViewer
                        image_url=image_url
                        detections=detections
                        selected_label=selected
                        config=config
                    />
                </section>
                <aside>
                    <StatsPanel detections=detections selected=selected/>
                    <ExportPanel detections=detections blueprint_id=blueprint_id/>
                </aside>
            </main>
        </div>
    }
}

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::mount_to_body(App);
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_engine::DetectionStats;

    #[test]
    fn test_demo_detections_cover_legend() {
        let stats = DetectionStats::from_detections(&demo_detections());
        assert_eq!(stats.total, 4);
        assert_eq!(stats.labels(), vec!["door", "room", "wall", "window"]);
    }

    #[test]
    fn test_frontend_config_defaults() {
        let config = frontend_config();
        assert!(config.validate().is_ok());
        assert!(!config.api_base_url.is_empty());
    }
}
