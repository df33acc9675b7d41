use std::thread;

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;
use profile_core::{ProfileFetcher, UserProfile};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{log_profile_fetch_failure, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

/// Endpoint the view fetches on its first rendered frame.
pub const PROFILE_ENDPOINT: &str = "https://api.github.com/users/fausto1712";

const AVATAR_SIZE: f32 = 120.0;
const STACK_SPACING: f32 = 20.0;

/// Decoded avatar pixels. Decoding happens on the worker so the GUI thread
/// only uploads a texture.
#[derive(Clone)]
pub struct AvatarImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

enum AvatarState {
    NotRequested,
    Loading,
    Ready {
        image: AvatarImage,
        texture: Option<TextureHandle>,
    },
    // Rendered identically to Loading; the distinction only reaches the log.
    Failed,
}

pub struct ProfileApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    // Single writer: the ProfileLoaded arm of process_ui_events.
    profile: Option<UserProfile>,
    avatar: AvatarState,
    fetch_dispatched: bool,
}

impl ProfileApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            profile: None,
            avatar: AvatarState::NotRequested,
            fetch_dispatched: false,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::ProfileLoaded(profile) => {
                    let avatar_url = profile.avatar_url.clone();
                    self.profile = Some(profile);
                    self.avatar = AvatarState::Loading;
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::FetchAvatar { url: avatar_url },
                    );
                }
                UiEvent::AvatarLoaded { image } => {
                    self.avatar = AvatarState::Ready {
                        image,
                        texture: None,
                    };
                }
                UiEvent::AvatarLoadFailed { reason } => {
                    tracing::warn!("avatar load failed, keeping placeholder: {reason}");
                    self.avatar = AvatarState::Failed;
                }
            }
        }
    }

    /// One profile fetch per app instance, scheduled on the first frame and
    /// never repeated by later re-renders.
    fn schedule_initial_fetch(&mut self) {
        if self.fetch_dispatched {
            return;
        }
        self.fetch_dispatched = true;
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::FetchProfile {
                endpoint: PROFILE_ENDPOINT.to_string(),
            },
        );
    }

    fn login_text(&self) -> &str {
        self.profile
            .as_ref()
            .map(|profile| profile.login.as_str())
            .unwrap_or("Username")
    }

    fn bio_text(&self) -> &str {
        self.profile
            .as_ref()
            .map(|profile| profile.bio.as_str())
            .unwrap_or("Bio")
    }

    fn work_pending(&self) -> bool {
        self.profile.is_none() || matches!(self.avatar, AvatarState::Loading)
    }

    fn show_avatar(&mut self, ui: &mut egui::Ui) {
        let (rect, _) =
            ui.allocate_exact_size(egui::vec2(AVATAR_SIZE, AVATAR_SIZE), egui::Sense::hover());

        if let AvatarState::Ready { image, texture } = &mut self.avatar {
            if texture.is_none() {
                let color_image = egui::ColorImage::from_rgba_unmultiplied(
                    [image.width, image.height],
                    &image.rgba,
                );
                *texture = Some(ui.ctx().load_texture(
                    "profile-avatar",
                    color_image,
                    egui::TextureOptions::LINEAR,
                ));
            }
            if let Some(texture) = texture.as_ref() {
                // Scale to fit the square frame, then clip to a circle.
                let (w, h) = (image.width.max(1) as f32, image.height.max(1) as f32);
                let scale = (AVATAR_SIZE / w).min(AVATAR_SIZE / h);
                let fitted = egui::vec2(w * scale, h * scale);
                let image_rect = egui::Rect::from_center_size(rect.center(), fitted);
                egui::Image::new(texture)
                    .corner_radius(AVATAR_SIZE / 2.0)
                    .paint_at(ui, image_rect);
                return;
            }
        }

        // NotRequested, Loading, and Failed all share the neutral circle.
        ui.painter()
            .circle_filled(rect.center(), AVATAR_SIZE / 2.0, egui::Color32::from_gray(110));
    }

    fn show_profile_card(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(24.0);
            ui.vertical_centered(|ui| {
                ui.style_mut().spacing.item_spacing = egui::vec2(STACK_SPACING, STACK_SPACING);

                self.show_avatar(ui);
                ui.label(egui::RichText::new(self.login_text()).strong().size(20.0));
                ui.label(self.bio_text());
            });
            // Remaining panel height stays empty below the card.
        });
    }
}

impl eframe::App for ProfileApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Events are applied before any widget is built, so a render never
        // observes a half-applied state change.
        self.process_ui_events();
        self.schedule_initial_fetch();
        self.show_profile_card(ctx);

        if self.work_pending() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

pub fn start_backend_bridge(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let fetcher = ProfileFetcher::new();

            // Sends after the window closes hit a disconnected channel and
            // are discarded; the recv loop then ends and the thread exits.
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::FetchProfile { endpoint } => {
                        tracing::info!("backend: fetch_profile");
                        match fetcher.fetch_profile(&endpoint).await {
                            Ok(profile) => {
                                let _ = ui_tx.try_send(UiEvent::ProfileLoaded(profile));
                            }
                            Err(err) => log_profile_fetch_failure(&err),
                        }
                    }
                    BackendCommand::FetchAvatar { url } => {
                        tracing::info!("backend: fetch_avatar");
                        match fetcher.fetch_avatar(&url).await {
                            Ok(bytes) => match decode_avatar_image(&bytes) {
                                Ok(image) => {
                                    let _ = ui_tx.try_send(UiEvent::AvatarLoaded { image });
                                }
                                Err(reason) => {
                                    let _ = ui_tx.try_send(UiEvent::AvatarLoadFailed { reason });
                                }
                            },
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::AvatarLoadFailed {
                                    reason: err.to_string(),
                                });
                            }
                        }
                    }
                }
            }
        });
    });
}

fn decode_avatar_image(bytes: &[u8]) -> Result<AvatarImage, String> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let resized = dynamic.thumbnail(256, 256).to_rgba8();
    let width = resized.width() as usize;
    let height = resized.height() as usize;
    Ok(AvatarImage {
        width,
        height,
        rgba: resized.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn test_app() -> (
        ProfileApp,
        Sender<UiEvent>,
        Receiver<BackendCommand>,
    ) {
        let (cmd_tx, cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        (ProfileApp::new(cmd_tx, ui_rx), ui_tx, cmd_rx)
    }

    fn sample_profile() -> UserProfile {
        UserProfile {
            login: "octocat".to_string(),
            avatar_url: "https://example/a.png".to_string(),
            bio: "hi".to_string(),
        }
    }

    #[test]
    fn placeholders_shown_before_fetch_resolves() {
        let (app, _ui_tx, _cmd_rx) = test_app();

        assert!(app.profile.is_none());
        assert!(matches!(app.avatar, AvatarState::NotRequested));
        assert_eq!(app.login_text(), "Username");
        assert_eq!(app.bio_text(), "Bio");
    }

    #[test]
    fn initial_fetch_dispatched_exactly_once() {
        let (mut app, _ui_tx, cmd_rx) = test_app();

        app.schedule_initial_fetch();
        app.schedule_initial_fetch();

        match cmd_rx.try_recv().expect("one fetch command") {
            BackendCommand::FetchProfile { endpoint } => {
                assert_eq!(endpoint, PROFILE_ENDPOINT);
            }
            BackendCommand::FetchAvatar { .. } => panic!("unexpected avatar fetch"),
        }
        assert!(cmd_rx.try_recv().is_err(), "fetch must not repeat");
    }

    #[test]
    fn profile_loaded_sets_state_and_requests_avatar() {
        let (mut app, ui_tx, cmd_rx) = test_app();

        ui_tx
            .try_send(UiEvent::ProfileLoaded(sample_profile()))
            .expect("queue event");
        app.process_ui_events();

        assert_eq!(app.profile, Some(sample_profile()));
        assert_eq!(app.login_text(), "octocat");
        assert_eq!(app.bio_text(), "hi");
        assert!(matches!(app.avatar, AvatarState::Loading));
        match cmd_rx.try_recv().expect("avatar command") {
            BackendCommand::FetchAvatar { url } => assert_eq!(url, "https://example/a.png"),
            BackendCommand::FetchProfile { .. } => panic!("unexpected profile fetch"),
        }
    }

    #[test]
    fn display_state_stays_absent_while_no_event_arrives() {
        let (mut app, _ui_tx, _cmd_rx) = test_app();

        // A failed fetch emits no event at all; the view keeps rendering the
        // pre-fetch placeholders and keeps polling for work.
        app.process_ui_events();

        assert!(app.profile.is_none());
        assert_eq!(app.login_text(), "Username");
        assert_eq!(app.bio_text(), "Bio");
        assert!(app.work_pending());
    }

    #[test]
    fn avatar_failure_keeps_placeholder_state() {
        let (mut app, ui_tx, cmd_rx) = test_app();

        ui_tx
            .try_send(UiEvent::ProfileLoaded(sample_profile()))
            .expect("queue profile");
        ui_tx
            .try_send(UiEvent::AvatarLoadFailed {
                reason: "decode failed".to_string(),
            })
            .expect("queue failure");
        app.process_ui_events();

        assert!(matches!(app.avatar, AvatarState::Failed));
        // Profile text is unaffected by the avatar's own state machine.
        assert_eq!(app.login_text(), "octocat");
        assert!(!app.work_pending());
        drop(cmd_rx);
    }

    #[test]
    fn avatar_loaded_becomes_ready_without_texture_until_first_render() {
        let (mut app, ui_tx, _cmd_rx) = test_app();

        ui_tx
            .try_send(UiEvent::AvatarLoaded {
                image: AvatarImage {
                    width: 2,
                    height: 2,
                    rgba: vec![0; 16],
                },
            })
            .expect("queue avatar");
        app.process_ui_events();

        match &app.avatar {
            AvatarState::Ready { image, texture } => {
                assert_eq!((image.width, image.height), (2, 2));
                assert!(texture.is_none());
            }
            _ => panic!("expected ready avatar"),
        }
    }

    #[test]
    fn decodes_png_avatar_bytes() {
        let mut png = Vec::new();
        let pixels = image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        image::DynamicImage::ImageRgba8(pixels)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .expect("encode png");

        let decoded = decode_avatar_image(&png).expect("decode avatar");
        assert_eq!((decoded.width, decoded.height), (4, 4));
        assert_eq!(decoded.rgba.len(), 4 * 4 * 4);
    }

    #[test]
    fn rejects_undecodable_avatar_bytes() {
        assert!(decode_avatar_image(b"definitely not an image").is_err());
    }
}
