//! UI/backend events and failure logging for the profile card controller.

use profile_core::{ProfileError, UserProfile};

use crate::ui::app::AvatarImage;

pub enum UiEvent {
    ProfileLoaded(UserProfile),
    AvatarLoaded { image: AvatarImage },
    AvatarLoadFailed { reason: String },
}

/// Single handling site for profile fetch failures. Each taxonomy entry gets
/// its own human-readable line; nothing is rethrown and nothing reaches the
/// rendered view, which keeps showing placeholder content.
pub fn log_profile_fetch_failure(err: &ProfileError) {
    match err {
        ProfileError::InvalidEndpoint { .. } => {
            tracing::error!("invalid profile endpoint: {err}");
        }
        ProfileError::InvalidResponse { .. } => {
            tracing::error!("invalid response from profile endpoint: {err}");
        }
        ProfileError::InvalidPayload { .. } => {
            tracing::error!("invalid profile payload: {err}");
        }
        ProfileError::Unexpected { .. } => {
            tracing::error!("unexpected profile fetch failure: {err}");
        }
    }
}
