//! Main application state and UI

use eframe::egui;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use plastome_toolkit::analysis::{
    run_fragment_pi, run_pi_window, run_region_batch, AnalysisError, FragmentBatchReport,
    FragmentKind, FragmentPiParams, PiWindowOutput, PiWindowParams, ProgressUpdate,
    RegionBatchReport, ThreadCount,
};
use plastome_toolkit::settings::{AppSettings, DEFAULT_SETTINGS_PATH};

const MAX_CONSOLE_LINES: usize = 500;

/// Analysis tools offered in the tool menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tool {
    RegionFinder,
    PiWindow,
    PiFragments,
}

impl Tool {
    const ALL: [Tool; 3] = [Tool::RegionFinder, Tool::PiWindow, Tool::PiFragments];

    fn label(&self) -> &'static str {
        match self {
            Self::RegionFinder => "Region Find",
            Self::PiWindow => "Pi - Sliding Window",
            Self::PiFragments => "Pi - Gene/IGS",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::RegionFinder => "Find the LSC, IRb, SSC and IRa regions of chloroplast genomes.",
            Self::PiWindow => "Nucleotide diversity of one alignment in sliding windows.",
            Self::PiFragments => "Nucleotide diversity of every gene or IGS alignment in a directory.",
        }
    }
}

/// Work handed to the background thread
enum JobRequest {
    Regions {
        inputs: Vec<PathBuf>,
        output_dir: PathBuf,
    },
    PiWindow {
        input: PathBuf,
        output_dir: PathBuf,
        params: PiWindowParams,
    },
    Fragments {
        input_dir: PathBuf,
        output_dir: PathBuf,
        reference_order: Option<PathBuf>,
        params: FragmentPiParams,
    },
}

impl JobRequest {
    fn run(
        self,
        progress_tx: &Sender<ProgressUpdate>,
        cancel: &AtomicBool,
    ) -> Result<JobOutput, AnalysisError> {
        match self {
            Self::Regions { inputs, output_dir } => {
                run_region_batch(&inputs, &output_dir, Some(progress_tx), cancel)
                    .map(JobOutput::Regions)
            }
            Self::PiWindow {
                input,
                output_dir,
                params,
            } => run_pi_window(&input, &output_dir, &params, Some(progress_tx), cancel)
                .map(JobOutput::PiWindow),
            Self::Fragments {
                input_dir,
                output_dir,
                reference_order,
                params,
            } => run_fragment_pi(
                &input_dir,
                &output_dir,
                reference_order.as_deref(),
                &params,
                Some(progress_tx),
                cancel,
            )
            .map(JobOutput::Fragments),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
enum JobOutput {
    Regions(RegionBatchReport),
    PiWindow(PiWindowOutput),
    Fragments(FragmentBatchReport),
}

/// A running background job
struct Job {
    tool: Tool,
    progress_rx: Receiver<ProgressUpdate>,
    result_rx: Receiver<Result<JobOutput, String>>,
    cancel: Arc<AtomicBool>,
}

/// Application state
pub struct PlastomeApp {
    settings: AppSettings,
    current_tool: Tool,

    // Region finder inputs
    region_inputs: Vec<PathBuf>,
    region_output: Option<PathBuf>,

    // Sliding-window Pi inputs
    pi_input: Option<PathBuf>,
    pi_output: Option<PathBuf>,
    pi_params: PiWindowParams,

    // Gene/IGS Pi inputs
    fragment_dir: Option<PathBuf>,
    fragment_output: Option<PathBuf>,
    fragment_order: Option<PathBuf>,
    fragment_params: FragmentPiParams,

    // Job state
    job: Option<Job>,
    progress: Option<ProgressUpdate>,
    console: Vec<String>,
    show_console: bool,

    // Results state
    results: Option<JobOutput>,
    save_error: Option<String>,
}

impl PlastomeApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self::with_settings(AppSettings::load(&DEFAULT_SETTINGS_PATH))
    }

    fn with_settings(settings: AppSettings) -> Self {
        let pi_params = PiWindowParams {
            window: settings.pi_window,
            step: settings.pi_step,
            n_as_gap: settings.n_as_gap,
            thread_count: settings.thread_count,
        };
        let fragment_params = FragmentPiParams {
            kind: settings.fragment_kind,
            n_as_gap: settings.n_as_gap,
            thread_count: settings.thread_count,
        };
        let output = settings.last_output_dir.clone();
        Self {
            settings,
            current_tool: Tool::RegionFinder,
            region_inputs: Vec::new(),
            region_output: output.clone(),
            pi_input: None,
            pi_output: output.clone(),
            pi_params,
            fragment_dir: None,
            fragment_output: output,
            fragment_order: None,
            fragment_params,
            job: None,
            progress: None,
            console: Vec::new(),
            show_console: true,
            results: None,
            save_error: None,
        }
    }

    fn log_line(&mut self, line: impl Into<String>) {
        self.console.push(line.into());
        if self.console.len() > MAX_CONSOLE_LINES {
            let excess = self.console.len() - MAX_CONSOLE_LINES;
            self.console.drain(..excess);
        }
    }

    /// Build the request for the current tool, or explain what is missing.
    fn build_request(&self) -> Result<JobRequest, String> {
        match self.current_tool {
            Tool::RegionFinder => {
                if self.region_inputs.is_empty() {
                    return Err("Please select input files.".to_string());
                }
                let output_dir = self
                    .region_output
                    .clone()
                    .ok_or("Please select an output directory.")?;
                Ok(JobRequest::Regions {
                    inputs: self.region_inputs.clone(),
                    output_dir,
                })
            }
            Tool::PiWindow => {
                let input = self.pi_input.clone().ok_or("Please select an alignment file.")?;
                let output_dir = self
                    .pi_output
                    .clone()
                    .ok_or("Please select an output directory.")?;
                Ok(JobRequest::PiWindow {
                    input,
                    output_dir,
                    params: self.pi_params.clone(),
                })
            }
            Tool::PiFragments => {
                let input_dir = self
                    .fragment_dir
                    .clone()
                    .ok_or("Please select the alignment directory.")?;
                let output_dir = self
                    .fragment_output
                    .clone()
                    .ok_or("Please select an output directory.")?;
                Ok(JobRequest::Fragments {
                    input_dir,
                    output_dir,
                    reference_order: self.fragment_order.clone(),
                    params: self.fragment_params.clone(),
                })
            }
        }
    }

    fn start_job(&mut self) {
        if self.job.is_some() {
            return;
        }
        let request = match self.build_request() {
            Ok(request) => request,
            Err(message) => {
                self.log_line(message);
                return;
            }
        };

        self.remember_settings();

        let (progress_tx, progress_rx) = channel();
        let (result_tx, result_rx) = channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_clone = Arc::clone(&cancel);

        self.log_line(format!("Running {}...", self.current_tool.label()));
        self.job = Some(Job {
            tool: self.current_tool,
            progress_rx,
            result_rx,
            cancel,
        });
        self.progress = None;
        self.results = None;

        thread::spawn(move || {
            let outcome = request
                .run(&progress_tx, &cancel_clone)
                .map_err(|e| e.to_string());
            let _ = result_tx.send(outcome);
        });
    }

    fn cancel_job(&mut self) {
        if let Some(job) = &self.job {
            job.cancel.store(true, Ordering::Relaxed);
            self.log_line("Cancelling...");
        }
    }

    fn check_job_progress(&mut self) {
        let Some(job) = &self.job else {
            return;
        };

        let updates: Vec<ProgressUpdate> = job.progress_rx.try_iter().collect();
        let finished = match job.result_rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Err("worker thread stopped without a result".to_string()))
            }
        };
        let tool = job.tool;

        for update in updates {
            self.log_line(update.message.clone());
            self.progress = Some(update);
        }

        if let Some(outcome) = finished {
            self.job = None;
            self.progress = None;
            match outcome {
                Ok(output) => {
                    self.log_line(format!("{} finished.", tool.label()));
                    self.results = Some(output);
                }
                Err(e) => self.log_line(format!("{} failed: {}", tool.label(), e)),
            }
        }
    }

    fn remember_settings(&mut self) {
        self.sync_settings();
        self.save_settings();
    }

    /// Copy form values into the settings; shared options come from the current tool.
    fn sync_settings(&mut self) {
        let (n_as_gap, thread_count) = match self.current_tool {
            Tool::PiFragments => (
                self.fragment_params.n_as_gap,
                self.fragment_params.thread_count,
            ),
            _ => (self.pi_params.n_as_gap, self.pi_params.thread_count),
        };
        self.pi_params.n_as_gap = n_as_gap;
        self.pi_params.thread_count = thread_count;
        self.fragment_params.n_as_gap = n_as_gap;
        self.fragment_params.thread_count = thread_count;

        self.settings.pi_window = self.pi_params.window;
        self.settings.pi_step = self.pi_params.step;
        self.settings.n_as_gap = n_as_gap;
        self.settings.fragment_kind = self.fragment_params.kind;
        self.settings.thread_count = thread_count;
        self.settings.last_output_dir = match self.current_tool {
            Tool::RegionFinder => self.region_output.clone(),
            Tool::PiWindow => self.pi_output.clone(),
            Tool::PiFragments => self.fragment_output.clone(),
        };
    }

    fn save_settings(&mut self) {
        if let Err(e) = self.settings.save(&DEFAULT_SETTINGS_PATH) {
            self.log_line(format!("Failed to save settings: {}", e));
        }
    }

    fn export_results(&mut self) {
        let Some(results) = &self.results else {
            self.save_error = Some("No results to save".to_string());
            return;
        };

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name("analysis_results.json")
            .save_file()
        {
            match serde_json::to_string_pretty(results) {
                Ok(json) => {
                    if let Err(e) = std::fs::write(&path, json) {
                        self.save_error = Some(format!("Failed to write file: {}", e));
                    } else {
                        self.save_error = None;
                    }
                }
                Err(e) => {
                    self.save_error = Some(format!("Failed to serialize: {}", e));
                }
            }
        }
    }

    fn pick_dir(&self) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new();
        if let Some(dir) = &self.settings.last_output_dir {
            dialog = dialog.set_directory(dir);
        }
        dialog.pick_folder()
    }

    fn input_dialog(&self) -> rfd::FileDialog {
        let dialog = rfd::FileDialog::new();
        match &self.settings.last_input_dir {
            Some(dir) => dialog.set_directory(dir),
            None => dialog,
        }
    }

    fn remember_input_dir(&mut self, path: &std::path::Path) {
        self.settings.last_input_dir = path.parent().map(|p| p.to_path_buf());
    }
}

fn path_label(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string())
}

impl eframe::App for PlastomeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.job.is_some() {
            self.check_job_progress();
            ctx.request_repaint();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Export Results...").clicked() {
                        self.export_results();
                        ui.close_menu();
                    }
                    if ui.button("Save Settings").clicked() {
                        self.remember_settings();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("Tools", |ui| {
                    for tool in Tool::ALL {
                        if ui.button(tool.label()).clicked() {
                            self.current_tool = tool;
                            ui.close_menu();
                        }
                    }
                });
                ui.menu_button("View", |ui| {
                    ui.checkbox(&mut self.show_console, "Console");
                });
            });
        });

        // Status bar
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.job.is_some() {
                    ui.spinner();
                    match &self.progress {
                        Some(progress) => {
                            ui.add(
                                egui::ProgressBar::new(progress.fraction())
                                    .desired_width(200.0)
                                    .text(&progress.message),
                            );
                        }
                        None => {
                            ui.label("Starting...");
                        }
                    }
                    if ui.button("Cancel").clicked() {
                        self.cancel_job();
                    }
                } else {
                    ui.label(self.current_tool.description());
                }
            });
        });

        if self.show_console {
            egui::TopBottomPanel::bottom("console")
                .resizable(true)
                .default_height(140.0)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.strong("Console");
                        if ui.small_button("Clear").clicked() {
                            self.console.clear();
                        }
                    });
                    egui::ScrollArea::vertical()
                        .id_salt("console_scroll")
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            for line in &self.console {
                                ui.monospace(line);
                            }
                        });
                });
        }

        // Tool list
        egui::SidePanel::left("tools").show(ctx, |ui| {
            ui.heading("Tools");
            ui.separator();
            for tool in Tool::ALL {
                ui.selectable_value(&mut self.current_tool, tool, tool.label());
            }
        });

        // Main content
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .id_salt("main_scroll")
                .show(ui, |ui| {
                    match self.current_tool {
                        Tool::RegionFinder => self.show_region_tool(ui),
                        Tool::PiWindow => self.show_pi_window_tool(ui),
                        Tool::PiFragments => self.show_fragment_tool(ui),
                    }
                    ui.add_space(10.0);
                    self.show_run_controls(ui);
                    ui.separator();
                    self.show_results(ui);
                });
        });
    }
}

impl PlastomeApp {
    fn show_region_tool(&mut self, ui: &mut egui::Ui) {
        ui.heading("Find Regions of Chloroplast Genome");
        ui.separator();

        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label("Input files (FASTA or GenBank):");
                if ui.button("Browse").clicked() {
                    if let Some(files) = self
                        .input_dialog()
                        .add_filter("Fasta files", &["fasta", "fa"])
                        .add_filter("GenBank files", &["gb", "gbk"])
                        .pick_files()
                    {
                        if let Some(first) = files.first() {
                            self.remember_input_dir(first);
                        }
                        self.region_inputs = files;
                    }
                }
                if ui.button("Clear").clicked() {
                    self.region_inputs.clear();
                }
            });
            if self.region_inputs.is_empty() {
                ui.label("(none)");
            }
            for path in &self.region_inputs {
                ui.monospace(path.display().to_string());
            }
        });

        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label("Output directory:");
                ui.monospace(path_label(&self.region_output));
                if ui.button("Select Directory").clicked() {
                    if let Some(dir) = self.pick_dir() {
                        self.region_output = Some(dir);
                    }
                }
            });
        });
    }

    fn show_pi_window_tool(&mut self, ui: &mut egui::Ui) {
        ui.heading("Pi Calculator - Window");
        ui.separator();

        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label("Alignment file:");
                ui.monospace(path_label(&self.pi_input));
                if ui.button("Browse").clicked() {
                    if let Some(file) = self
                        .input_dialog()
                        .add_filter("Fasta Files", &["fasta", "fa", "fas"])
                        .pick_file()
                    {
                        self.remember_input_dir(&file);
                        self.pi_input = Some(file);
                    }
                }
            });
            ui.horizontal(|ui| {
                ui.label("Output directory:");
                ui.monospace(path_label(&self.pi_output));
                if ui.button("Browse").clicked() {
                    if let Some(dir) = self.pick_dir() {
                        self.pi_output = Some(dir);
                    }
                }
            });
        });

        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label("Window size:");
                ui.add(egui::DragValue::new(&mut self.pi_params.window).range(0..=1_000_000));
                ui.add_space(20.0);
                ui.label("Step size:");
                ui.add(egui::DragValue::new(&mut self.pi_params.step).range(0..=1_000_000));
            });
            ui.label("0 uses the whole conserved alignment; larger values are clamped to it.");
            ui.checkbox(&mut self.pi_params.n_as_gap, "Treat N as a gap");
            show_thread_count(ui, &mut self.pi_params.thread_count);
        });
    }

    fn show_fragment_tool(&mut self, ui: &mut egui::Ui) {
        ui.heading("Pi Calculator - Gene/IGS");
        ui.separator();

        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label("Alignment directory:");
                ui.monospace(path_label(&self.fragment_dir));
                if ui.button("Browse").clicked() {
                    if let Some(dir) = self.pick_dir() {
                        self.fragment_dir = Some(dir);
                    }
                }
            });
            ui.horizontal(|ui| {
                ui.label("Reference order file:");
                ui.monospace(path_label(&self.fragment_order));
                if ui.button("Browse").clicked() {
                    if let Some(file) = self.input_dialog().pick_file() {
                        self.fragment_order = Some(file);
                    }
                }
                if ui.button("Clear").clicked() {
                    self.fragment_order = None;
                }
            });
            ui.horizontal(|ui| {
                ui.label("Output directory:");
                ui.monospace(path_label(&self.fragment_output));
                if ui.button("Browse").clicked() {
                    if let Some(dir) = self.pick_dir() {
                        self.fragment_output = Some(dir);
                    }
                }
            });
        });

        ui.group(|ui| {
            egui::ComboBox::from_label("Mode")
                .selected_text(self.fragment_params.kind.label())
                .show_ui(ui, |ui| {
                    for kind in FragmentKind::ALL {
                        ui.selectable_value(&mut self.fragment_params.kind, kind, kind.label());
                    }
                });
            ui.checkbox(&mut self.fragment_params.n_as_gap, "Treat N as a gap");
            show_thread_count(ui, &mut self.fragment_params.thread_count);
        });
    }

    fn show_run_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let running = self.job.is_some();
            if ui
                .add_enabled(!running, egui::Button::new("Run Analysis"))
                .clicked()
            {
                self.start_job();
            }
            if running && ui.button("Cancel").clicked() {
                self.cancel_job();
            }
        });
    }

    fn show_results(&mut self, ui: &mut egui::Ui) {
        let Some(results) = &self.results else {
            ui.label("No results yet.");
            return;
        };

        match results {
            JobOutput::Regions(report) => show_region_results(ui, report),
            JobOutput::PiWindow(output) => show_pi_results(ui, output),
            JobOutput::Fragments(report) => show_fragment_results(ui, report),
        }

        if let Some(ref error) = self.save_error {
            ui.colored_label(egui::Color32::RED, error);
        }
    }
}

fn show_thread_count(ui: &mut egui::Ui, thread_count: &mut ThreadCount) {
    ui.horizontal(|ui| {
        ui.label("Threads:");
        let mut auto = matches!(thread_count, ThreadCount::Auto);
        if ui.checkbox(&mut auto, "Auto").changed() {
            *thread_count = if auto {
                ThreadCount::Auto
            } else {
                ThreadCount::Fixed(ThreadCount::Auto.get_count())
            };
        }
        if let ThreadCount::Fixed(n) = thread_count {
            ui.add(egui::DragValue::new(n).range(1..=256));
        }
    });
}

fn show_region_results(ui: &mut egui::Ui, report: &RegionBatchReport) {
    ui.heading("Region Results");
    ui.label(format!("Summary: {}", report.summary_path.display()));

    egui::Grid::new("region_results")
        .striped(true)
        .show(ui, |ui| {
            for header in ["File", "LSC", "IRb", "SSC", "IRa", "GC %", "Note"] {
                ui.strong(header);
            }
            ui.end_row();

            for file in &report.files {
                ui.label(&file.file_name);
                match &file.regions {
                    Some(regions) => {
                        let n = regions.genome_length;
                        for span in &regions.spans {
                            ui.monospace(format!(
                                "{} ({} bp)",
                                span.interval.coordinates(n),
                                span.interval.len
                            ));
                        }
                        ui.label(format!("{:.2}", regions.total_gc));
                        ui.label("");
                    }
                    None => {
                        let color = if file.failed {
                            egui::Color32::RED
                        } else {
                            egui::Color32::YELLOW
                        };
                        for _ in 0..5 {
                            ui.label("");
                        }
                        ui.colored_label(color, &file.line);
                    }
                }
                ui.end_row();
            }
        });
}

fn show_pi_results(ui: &mut egui::Ui, output: &PiWindowOutput) {
    let report = &output.report;
    ui.heading("Pi Results");
    ui.monospace(report.render_header());
    ui.label(format!("Table: {}", output.table_path.display()));

    show_pi_profile(ui, output);

    egui::ScrollArea::vertical()
        .id_salt("pi_table")
        .max_height(300.0)
        .show(ui, |ui| {
            egui::Grid::new("pi_windows").striped(true).show(ui, |ui| {
                for header in ["Start", "End", "Midpoint", "Pi", "S"] {
                    ui.strong(header);
                }
                ui.end_row();
                for w in &report.windows {
                    ui.monospace(w.start.to_string());
                    ui.monospace(w.end.to_string());
                    ui.monospace(w.midpoint.to_string());
                    ui.monospace(format!("{:.5}", w.pi));
                    ui.monospace(w.segregating_sites.to_string());
                    ui.end_row();
                }
            });
        });
}

/// Pi against window midpoint, drawn as a simple line profile.
fn show_pi_profile(ui: &mut egui::Ui, output: &PiWindowOutput) {
    let windows = &output.report.windows;
    if windows.len() < 2 {
        return;
    }

    let width = ui.available_width().max(200.0);
    let (response, painter) =
        ui.allocate_painter(egui::vec2(width, 160.0), egui::Sense::hover());
    let rect = response.rect.shrink(20.0);
    let axis = egui::Stroke::new(1.0, egui::Color32::GRAY);
    painter.line_segment([rect.left_bottom(), rect.right_bottom()], axis);
    painter.line_segment([rect.left_bottom(), rect.left_top()], axis);

    let max_x = output.report.alignment_length.max(1) as f32;
    let max_pi = windows
        .iter()
        .map(|w| w.pi)
        .fold(0.0_f64, f64::max)
        .max(1e-9) as f32;

    let points: Vec<egui::Pos2> = windows
        .iter()
        .map(|w| {
            egui::pos2(
                rect.left() + rect.width() * (w.midpoint as f32 / max_x),
                rect.bottom() - rect.height() * (w.pi as f32 / max_pi),
            )
        })
        .collect();
    painter.add(egui::Shape::line(
        points,
        egui::Stroke::new(1.5, egui::Color32::from_rgb(70, 130, 180)),
    ));
    painter.text(
        rect.left_top(),
        egui::Align2::LEFT_BOTTOM,
        format!("{:.5}", max_pi),
        egui::FontId::monospace(10.0),
        egui::Color32::GRAY,
    );
}

fn show_fragment_results(ui: &mut egui::Ui, report: &FragmentBatchReport) {
    ui.heading("Gene/IGS Pi Results");
    ui.label(format!("Results: {}", report.results_path.display()));
    if let Some(path) = &report.sorted_path {
        ui.label(format!("Sorted: {}", path.display()));
    }

    let rows = if report.sorted_path.is_some() {
        &report.sorted
    } else {
        &report.results
    };

    egui::ScrollArea::vertical()
        .id_salt("fragment_table")
        .max_height(300.0)
        .show(ui, |ui| {
            egui::Grid::new("fragments").striped(true).show(ui, |ui| {
                ui.strong("Fragment");
                ui.strong("Pi");
                ui.end_row();
                for fragment in rows {
                    ui.label(&fragment.name);
                    ui.monospace(format!("{:.5}", fragment.pi));
                    ui.end_row();
                }
            });
        });

    for failure in &report.failures {
        ui.colored_label(
            egui::Color32::RED,
            format!("{}: {}", failure.file_name, failure.error),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_app() -> PlastomeApp {
        PlastomeApp::with_settings(AppSettings::default())
    }

    #[test]
    fn test_fragment_tool_options_are_remembered() {
        let mut app = idle_app();
        app.current_tool = Tool::PiFragments;
        app.fragment_params.kind = FragmentKind::Igs;
        app.fragment_params.n_as_gap = true;
        app.fragment_params.thread_count = ThreadCount::Fixed(3);
        app.sync_settings();

        assert!(app.settings.n_as_gap);
        assert_eq!(app.settings.thread_count, ThreadCount::Fixed(3));
        assert_eq!(app.settings.fragment_kind, FragmentKind::Igs);
        assert!(app.pi_params.n_as_gap);
        assert_eq!(app.pi_params.thread_count, ThreadCount::Fixed(3));
    }

    #[test]
    fn test_window_tool_options_are_remembered() {
        let mut app = idle_app();
        app.current_tool = Tool::PiWindow;
        app.pi_params.window = 900;
        app.pi_params.thread_count = ThreadCount::Fixed(2);
        app.sync_settings();

        assert_eq!(app.settings.pi_window, 900);
        assert_eq!(app.settings.thread_count, ThreadCount::Fixed(2));
        assert_eq!(app.fragment_params.thread_count, ThreadCount::Fixed(2));
    }

    #[test]
    fn test_dead_worker_clears_job() {
        let mut app = idle_app();
        let (_progress_tx, progress_rx) = channel();
        let (result_tx, result_rx) = channel::<Result<JobOutput, String>>();
        drop(result_tx);
        app.job = Some(Job {
            tool: Tool::PiWindow,
            progress_rx,
            result_rx,
            cancel: Arc::new(AtomicBool::new(false)),
        });

        app.check_job_progress();

        assert!(app.job.is_none());
        assert!(app.results.is_none());
        let last = app.console.last().unwrap();
        assert!(last.contains("failed"), "{last}");
    }

    #[test]
    fn test_running_job_stays_active() {
        let mut app = idle_app();
        let (progress_tx, progress_rx) = channel();
        let (_result_tx, result_rx) = channel::<Result<JobOutput, String>>();
        app.job = Some(Job {
            tool: Tool::RegionFinder,
            progress_rx,
            result_rx,
            cancel: Arc::new(AtomicBool::new(false)),
        });
        progress_tx
            .send(ProgressUpdate::new(1, 4, "Processed 1/4"))
            .unwrap();

        app.check_job_progress();

        assert!(app.job.is_some());
        assert_eq!(app.progress.as_ref().map(|p| p.completed), Some(1));
        assert_eq!(app.console, vec!["Processed 1/4".to_string()]);
    }
}
