//! Control panel: model picker, load options and scene settings.

use std::path::{Path, PathBuf};

use asset::{AssemblyMode, LoadOptions, NgonPolicy, VertexPacking, list_obj_files};
use egui::{Color32, ComboBox, RichText, Slider, Ui};
use renderer::SceneSettings;

/// What the event loop should reload before the next frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ReloadRequest {
    pub path: PathBuf,
    pub options: LoadOptions,
    pub packing: VertexPacking,
}

/// Panel state. Pure data apart from [`ControlPanel::show`].
pub struct ControlPanel {
    models_dir: PathBuf,
    models: Vec<String>,
    selected: Option<usize>,
    pending: bool,
    pub settings: SceneSettings,
    pub options: LoadOptions,
    pub packing: VertexPacking,
    pub show_fps: bool,
    last_error: Option<String>,
    /// (vertices, triangles) of the loaded model.
    stats: (usize, u32),
}

impl ControlPanel {
    pub fn new(
        models_dir: impl Into<PathBuf>,
        options: LoadOptions,
        packing: VertexPacking,
    ) -> Self {
        let mut panel = Self {
            models_dir: models_dir.into(),
            models: Vec::new(),
            selected: None,
            pending: false,
            settings: SceneSettings::default(),
            options,
            packing,
            show_fps: false,
            last_error: None,
            stats: (0, 0),
        };
        panel.rescan();
        panel
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn selected_model(&self) -> Option<&str> {
        self.selected.and_then(|i| self.models.get(i)).map(String::as_str)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Re-read the model directory, keeping the selection by name.
    pub fn rescan(&mut self) {
        let current = self.selected_model().map(str::to_owned);
        match list_obj_files(&self.models_dir) {
            Ok(models) => {
                log::info!(
                    "Found {} model(s) in {}",
                    models.len(),
                    self.models_dir.display()
                );
                self.models = models;
                self.last_error = None;
            }
            Err(err) => {
                log::warn!("{err:#}");
                self.models.clear();
                self.last_error = Some(format!("{err:#}"));
            }
        }
        self.selected = current.and_then(|name| self.models.iter().position(|m| *m == name));
    }

    /// Select a model by index and queue a reload. Out-of-range is ignored.
    pub fn select(&mut self, index: usize) {
        if index < self.models.len() {
            self.selected = Some(index);
            self.pending = true;
        }
    }

    /// Select a model by file name. Returns false when it is not listed.
    pub fn select_by_name(&mut self, name: &str) -> bool {
        match self.models.iter().position(|m| m == name) {
            Some(i) => {
                self.select(i);
                true
            }
            None => false,
        }
    }

    /// Queue a reload of the current selection (e.g. after an option change).
    pub fn request_reload(&mut self) {
        if self.selected.is_some() {
            self.pending = true;
        }
    }

    /// Take the queued reload, if any.
    pub fn take_pending(&mut self) -> Option<ReloadRequest> {
        if !std::mem::take(&mut self.pending) {
            return None;
        }
        let name = self.selected_model()?;
        Some(ReloadRequest {
            path: Path::new(&self.models_dir).join(name),
            options: self.options,
            packing: self.packing,
        })
    }

    /// Record the outcome of a reload.
    pub fn report_load<E: std::fmt::Display>(&mut self, result: Result<(usize, u32), E>) {
        match result {
            Ok(stats) => {
                self.stats = stats;
                self.last_error = None;
            }
            Err(err) => {
                log::error!("Model load failed: {err}");
                self.last_error = Some(err.to_string());
            }
        }
    }

    pub fn show(&mut self, ctx: &egui::Context, fps: Option<f32>) {
        egui::Window::new("Scene")
            .default_pos([10.0, 10.0])
            .resizable(false)
            .show(ctx, |ui| {
                self.model_section(ui);
                ui.separator();
                self.load_section(ui);
                ui.separator();
                self.display_section(ui);

                if self.show_fps {
                    if let Some(fps) = fps {
                        ui.separator();
                        ui.label(format!("FPS: {fps:.1}"));
                    }
                }
                if let Some(err) = &self.last_error {
                    ui.separator();
                    ui.label(RichText::new(err).color(Color32::from_rgb(255, 96, 96)));
                }
            });
    }

    fn model_section(&mut self, ui: &mut Ui) {
        let preview = self.selected_model().unwrap_or("<none>").to_owned();
        let mut picked = None;
        ui.horizontal(|ui| {
            ComboBox::from_label("Model")
                .selected_text(preview)
                .show_ui(ui, |ui| {
                    for (i, name) in self.models.iter().enumerate() {
                        if ui.selectable_label(self.selected == Some(i), name).clicked() {
                            picked = Some(i);
                        }
                    }
                });
            if ui.button("Rescan").clicked() {
                self.rescan();
            }
        });
        if let Some(i) = picked {
            self.select(i);
        }
        let (vertices, triangles) = self.stats;
        ui.label(format!("{vertices} vertices, {triangles} triangles"));
    }

    fn load_section(&mut self, ui: &mut Ui) {
        let before = (self.options, self.packing);

        ui.horizontal(|ui| {
            ui.label("Packing");
            ui.radio_value(&mut self.packing, VertexPacking::Interleaved, "Interleaved");
            ui.radio_value(&mut self.packing, VertexPacking::Planar, "Planar");
        });
        ui.horizontal(|ui| {
            ui.label("Vertices");
            ui.radio_value(&mut self.options.assembly, AssemblyMode::Flat, "Flat");
            ui.radio_value(&mut self.options.assembly, AssemblyMode::Deduplicated, "Deduplicated");
        });
        ui.horizontal(|ui| {
            ui.label("N-gons");
            ui.radio_value(&mut self.options.ngon, NgonPolicy::Truncate, "Truncate");
            ui.radio_value(&mut self.options.ngon, NgonPolicy::Fan, "Fan");
        });

        if before != (self.options, self.packing) {
            self.request_reload();
        }
    }

    fn display_section(&mut self, ui: &mut Ui) {
        let s = &mut self.settings;
        ui.checkbox(&mut s.show_grid, "Show grid");
        ui.checkbox(&mut s.show_light, "Show light");
        ui.horizontal(|ui| {
            ui.label("Light position");
            for c in &mut s.light_position {
                ui.add(egui::DragValue::new(c).speed(0.05));
            }
        });
        ui.horizontal(|ui| {
            ui.color_edit_button_rgb(&mut s.light_color);
            ui.label("Light color");
        });
        ui.horizontal(|ui| {
            ui.color_edit_button_rgb(&mut s.object_color);
            ui.label("Object color");
        });
        ui.horizontal(|ui| {
            ui.color_edit_button_rgb(&mut s.clear_color);
            ui.label("Background");
        });
        ui.add(Slider::new(&mut s.shininess, 1.0..=512.0).text("Shininess"));
    }
}
