//! Scripted headless tour of the exhibition
//!
//! Walks through every hall the way a visitor would: enter, look around,
//! open the popup of the first painting in view, then press the number key
//! of the next hall. Hall switches go through the same callback a real
//! host would wire to its UI.
//!
//! Usage: `gallery_tour [config.toml|config.ron] [asset-root]`

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use exhibit_engine::config::ConfigError;
use exhibit_engine::foundation::logging;
use exhibit_engine::foundation::math::Vec4;
use exhibit_engine::hall::HALL_IDS;
use exhibit_engine::prelude::*;

const MAX_TRANSITION_SECONDS: f32 = 30.0;

#[derive(Debug, thiserror::Error)]
enum TourError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Transition to '{0}' did not finish")]
    Stalled(String),
}

struct TourApp {
    engine: SceneManager,
    frame: f32,
    requests: Rc<RefCell<VecDeque<String>>>,
    popups: Rc<RefCell<usize>>,
}

impl TourApp {
    fn new(config: ExhibitionConfig, images: Arc<dyn ImageSource>) -> Result<Self, TourError> {
        let frame = config.engine.target_frame_time();
        let mut engine = SceneManager::new(config, HeadlessBackend::new(), images);
        engine.initialize()?;

        let requests = Rc::new(RefCell::new(VecDeque::new()));
        let popups = Rc::new(RefCell::new(0));

        let queue = Rc::clone(&requests);
        let opened = Rc::clone(&popups);
        engine
            .callbacks_mut()
            .on_hall_switch_requested(move |hall| queue.borrow_mut().push_back(hall.to_string()))
            .on_click(|_, tag| log::info!("Clicked {:?} '{}'", tag.kind(), tag.title().unwrap_or("-")))
            .subscribe(move |event| match event {
                EngineEvent::Interaction(InteractionEvent::PopupOpened { title, .. }) => {
                    *opened.borrow_mut() += 1;
                    log::info!("Popup: {}", title);
                }
                EngineEvent::TransitionStarted { from, to } => {
                    log::info!("Leaving {:?} for '{}'", from, to);
                }
                EngineEvent::TransitionFailed { hall, reason } => {
                    log::error!("Could not open '{}': {}", hall, reason);
                }
                _ => {}
            });

        Ok(Self {
            engine,
            frame,
            requests,
            popups,
        })
    }

    fn run(&mut self) -> Result<(), TourError> {
        self.visit(HALL_IDS[0])?;

        for digit in 2..=HALL_IDS.len() {
            self.look_around()?;
            self.open_first_popup()?;
            self.press(KeyCode::Escape)?;

            self.press(KeyCode::Digit(digit as u8))?;
            self.tick(1)?;
            let next = self.requests.borrow_mut().pop_front();
            match next {
                Some(hall) => self.visit(&hall)?,
                None => log::warn!("No hall bound to key {}", digit),
            }
        }

        self.look_around()?;
        self.open_first_popup()?;
        Ok(())
    }

    fn visit(&mut self, hall: &str) -> Result<(), TourError> {
        let ticket = self.engine.switch_scene(hall, None)?;
        let max_ticks = (MAX_TRANSITION_SECONDS / self.frame).ceil() as usize;
        for _ in 0..max_ticks {
            self.engine.update(self.frame)?;
            if let Some(result) = ticket.try_take() {
                let id = result?;
                let scene = self.engine.current_hall();
                log::info!(
                    "Entered '{}' ({} artworks, {} exits)",
                    scene.map_or(id.as_str(), |scene| scene.name()),
                    scene.map_or(0, |scene| scene.artworks().len()),
                    self.engine.entrance_markers().len()
                );
                return Ok(());
            }
        }
        Err(TourError::Stalled(hall.to_string()))
    }

    /// Walk forward for a second, then turn a little
    fn look_around(&mut self) -> Result<(), TourError> {
        self.engine.handle_input(&InputEvent::KeyDown(KeyCode::KeyW))?;
        self.tick(60)?;
        self.engine.handle_input(&InputEvent::KeyUp(KeyCode::KeyW))?;

        let (width, height) = self.viewport();
        let (x, y) = (width * 0.5, height * 0.5);
        self.engine.handle_input(&InputEvent::PointerDown {
            button: PointerButton::Left,
            x,
            y,
        })?;
        self.engine.handle_input(&InputEvent::PointerMove { x: x + 40.0, y })?;
        self.engine.handle_input(&InputEvent::PointerUp {
            button: PointerButton::Left,
        })?;
        self.tick(10)
    }

    fn open_first_popup(&mut self) -> Result<(), TourError> {
        let target = self
            .engine
            .current_hall()
            .into_iter()
            .flat_map(|hall| hall.artworks().iter().map(|artwork| artwork.position))
            .find_map(|position| self.to_screen(position));

        match target {
            Some((x, y)) => {
                self.engine.handle_input(&InputEvent::Click { x, y })?;
                self.tick(20)
            }
            None => {
                log::info!("No painting in view");
                Ok(())
            }
        }
    }

    fn to_screen(&self, point: Vec3) -> Option<(f32, f32)> {
        let camera = &self.engine.engine()?.camera;
        let clip = camera.view_projection_matrix() * Vec4::new(point.x, point.y, point.z, 1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let (ndc_x, ndc_y) = (clip.x / clip.w, clip.y / clip.w);
        if ndc_x.abs() > 1.0 || ndc_y.abs() > 1.0 {
            return None;
        }
        let (width, height) = self.viewport();
        Some(((ndc_x + 1.0) * 0.5 * width, (1.0 - ndc_y) * 0.5 * height))
    }

    fn viewport(&self) -> (f32, f32) {
        let engine = &self.engine.config().engine;
        (engine.viewport_width as f32, engine.viewport_height as f32)
    }

    fn press(&mut self, key: KeyCode) -> Result<(), TourError> {
        self.engine.handle_input(&InputEvent::KeyDown(key))?;
        self.engine.handle_input(&InputEvent::KeyUp(key))?;
        Ok(())
    }

    fn tick(&mut self, frames: usize) -> Result<(), TourError> {
        for _ in 0..frames {
            self.engine.update(self.frame)?;
        }
        Ok(())
    }

    fn report(&self) {
        let stats = self.engine.performance_stats();
        let target = self.engine.config().engine.target_fps as f32;
        println!("Tour finished");
        println!("  halls visited:   {}", HALL_IDS.len());
        println!("  popups opened:   {}", self.popups.borrow());
        println!("  frames:          {}", stats.frames);
        println!("  rendered:        {}", stats.rendered_frames);
        println!("  skipped:         {}", stats.skipped_frames);
        println!("  fps:             {:.0}", stats.fps);
        println!("  draw items:      {}", stats.draw_items);
        println!("  lights:          {}", stats.lights);
        println!("  performance ok:  {}", stats.is_performance_good(target));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => ExhibitionConfig::load_from_file(&path)?,
        None => ExhibitionConfig::default(),
    };
    logging::init_with_filter(&config.engine.log_level);

    let images: Arc<dyn ImageSource> = match args.next() {
        Some(root) => Arc::new(FileImageSource::new(root)),
        None => Arc::new(MemoryImageSource::new()),
    };

    let mut app = TourApp::new(config, images)?;
    let outcome = app.run();
    app.report();
    app.engine.destroy();

    if let Err(err) = outcome {
        log::error!("Tour aborted: {}", err);
        return Err(err.into());
    }
    Ok(())
}
