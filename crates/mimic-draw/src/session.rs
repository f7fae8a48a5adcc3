//! A drawing session: one target, one pen, one controller.

use log::info;
use mimic_project::{Target, TargetError};

use crate::controller::{AnchoredController, InteractionMode, TickOutput};
use crate::frame::{ButtonTracker, FrameInput, FrameSource};
use crate::settings::DrawSettings;
use crate::stroke::StrokeSink;

/// Everything one drawing session owns.
///
/// Frames are fed in one at a time, from a [`FrameSource`] or directly;
/// strokes leave through a [`StrokeSink`].
#[derive(Debug)]
pub struct DrawingSession {
    settings: DrawSettings,
    target: Target,
    controller: AnchoredController,
    action: ButtonTracker,
    toggle: ButtonTracker,
}

impl DrawingSession {
    /// Session drawing on `target`.
    pub fn new(settings: DrawSettings, mut target: Target) -> Self {
        target.set_solver_mode(settings.solver);
        let controller = AnchoredController::new(&settings);
        Self {
            settings,
            target,
            controller,
            action: ButtonTracker::default(),
            toggle: ButtonTracker::default(),
        }
    }

    /// Load the configured target and start a session on it.
    pub fn load(settings: DrawSettings) -> Result<Self, TargetError> {
        let target = Target::load(&settings.target)?;
        Ok(Self::new(settings, target))
    }

    /// Session settings.
    pub fn settings(&self) -> &DrawSettings {
        &self.settings
    }

    /// The current target.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The controller.
    pub fn controller(&self) -> &AnchoredController {
        &self.controller
    }

    /// Replace the target, cancelling any stroke on the old one.
    ///
    /// The old target and its solver are released here.
    pub fn replace_target(&mut self, mut target: Target, sink: &mut dyn StrokeSink) {
        self.controller.cancel(sink);
        target.set_solver_mode(self.settings.solver);
        let old = std::mem::replace(&mut self.target, target);
        info!("switched target from {} to {}", old.name(), self.target.name());
    }

    /// Process one frame.
    ///
    /// Releasing the toggle button switches between drawing and erasing.
    /// The toggle is ignored on purpose while the action button is held or
    /// on the frame it is released, and switching to erasing discards the
    /// active stroke.
    pub fn tick(&mut self, input: &FrameInput, sink: &mut dyn StrokeSink) -> TickOutput {
        let action = self.action.update(input.action);
        let toggle = self.toggle.update(input.toggle);

        if toggle.just_released && !action.pressed && !action.just_released {
            let mode = self.controller.interaction().toggled();
            info!("interaction mode: {:?}", mode);
            self.controller.set_interaction(mode, sink);
        }

        self.controller.tick(&mut self.target, input, action, sink)
    }

    /// Process every frame of `source`, then finalize any open stroke.
    ///
    /// Returns the number of frames processed.
    pub fn run(&mut self, source: &mut dyn FrameSource, sink: &mut dyn StrokeSink) -> usize {
        let mut frames = 0;
        while let Some(input) = source.next_frame() {
            self.tick(&input, sink);
            frames += 1;
        }
        self.controller.finish(sink);
        frames
    }

    /// Current interaction mode.
    pub fn interaction(&self) -> InteractionMode {
        self.controller.interaction()
    }
}
