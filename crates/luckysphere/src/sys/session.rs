use crate::config::{self, Config, ConfigError};
use crate::events::{AppEvent, PresentationEvent};
use crate::sphere::{
    self, DeviceProfile, DrawOutcome, ExpandError, PoolEntry, PrizeSpec, ProfileError,
    ResolveError, SpinEngine, SpinError, SpinPhase, SpinStep, SphereRotation,
};
use crate::sys::draw::{DrawError, DrawService};
use async_channel::{Receiver, Sender, TrySendError};
use drawctl::DrawCode;
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Expand(#[from] ExpandError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Spin(#[from] SpinError),
    #[error(transparent)]
    Draw(#[from] DrawError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

type ConfigLoader = fn() -> Result<Config, ConfigError>;

/// A draw request in flight. Dropping it aborts the request.
struct PendingDraw(JoinHandle<Result<DrawOutcome, DrawError>>);

impl PendingDraw {
    fn spawn<D: DrawService>(service: Arc<D>, code: DrawCode) -> Self {
        Self(tokio::spawn(async move { service.request_draw(code).await }))
    }

    async fn wait(slot: &mut Option<PendingDraw>) -> Result<DrawOutcome, DrawError> {
        match slot {
            Some(pending) => (&mut pending.0)
                .await
                .unwrap_or_else(|e| Err(DrawError::Failed(format!("draw task ended: {}", e)))),
            None => std::future::pending().await,
        }
    }
}

impl Drop for PendingDraw {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Ties catalog, layout, draw service and spin engine together on one cooperative loop.
pub struct Session<D, R> {
    profile: DeviceProfile,
    catalog: Vec<PrizeSpec>,
    pool: Vec<PoolEntry>,
    engine: SpinEngine,
    rotation: SphereRotation,
    next_tick: Option<Instant>,
    reload_deferred: bool,
    service: Arc<D>,
    rng: R,
    sink: Sender<PresentationEvent>,
    loader: ConfigLoader,
}

impl<D: DrawService, R: Rng> Session<D, R> {
    pub fn new(
        config: &Config,
        service: D,
        rng: R,
        sink: Sender<PresentationEvent>,
    ) -> Result<Self, SessionError> {
        let profile = config.profile()?;
        let pool = sphere::expand(&config.prizes, profile.pool_length)?;

        log::info!(
            "{} prizes on a {} sphere of {} cards",
            config.prizes.len(),
            profile.mode,
            pool.len()
        );

        Ok(Self {
            profile,
            catalog: config.prizes.clone(),
            pool,
            engine: SpinEngine::new(profile.spin_tuning()),
            rotation: SphereRotation::default(),
            next_tick: None,
            reload_deferred: false,
            service: Arc::new(service),
            rng,
            sink,
            loader: config::load_config,
        })
    }

    /// Replaces the function used to re-read the config on `ConfigReload`.
    pub fn with_loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn pool(&self) -> &[PoolEntry] {
        &self.pool
    }

    pub fn phase(&self) -> SpinPhase {
        self.engine.phase()
    }

    /// Runs until `Close` arrives or every event sender is gone.
    ///
    /// The ambient rotation only ticks while nothing is being drawn or spun. Pending timers,
    /// draw requests and code verifications are released when this returns.
    pub async fn run(mut self, events: Receiver<AppEvent>) {
        self.publish_layout();

        let mut ambient = self.ambient_interval();
        let mut draw: Option<PendingDraw> = None;
        let mut verifications = JoinSet::new();

        loop {
            if ambient.period() != self.profile.frame_interval() {
                ambient = self.ambient_interval();
            }
            let deadline = self.next_tick;
            let ambient_on = draw.is_none() && !self.engine.is_busy();

            tokio::select! {
                event = events.recv() => match event {
                    Ok(AppEvent::Close) | Err(_) => break,
                    Ok(AppEvent::Spin(code)) => self.request_spin(code, &mut draw),
                    Ok(AppEvent::Verify(code)) => self.request_verify(code, &mut verifications),
                    Ok(AppEvent::ConfigReload) => self.reload(draw.is_some()),
                },
                _ = ambient.tick(), if ambient_on => self.ambient_frame(),
                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.spin_tick();
                }
                result = PendingDraw::wait(&mut draw), if draw.is_some() => {
                    draw = None;
                    self.on_draw_result(result);
                }
                Some(joined) = verifications.join_next(), if !verifications.is_empty() => {
                    match joined {
                        Ok(event) => self.emit(event),
                        Err(e) => log::warn!("Verification task ended: {}", e),
                    }
                }
            }
        }

        log::info!("Lucky draw session closed");
    }

    fn ambient_interval(&self) -> time::Interval {
        let mut interval = time::interval(self.profile.frame_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval
    }

    fn emit(&self, event: PresentationEvent) {
        match self.sink.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                log::debug!("Presentation sink is full, dropping {:?}", event)
            }
            Err(TrySendError::Closed(_)) => log::trace!("Presentation sink is closed"),
        }
    }

    fn publish_layout(&self) {
        let cards = sphere::place_cards(self.pool.len(), &self.profile);
        self.emit(PresentationEvent::Layout(cards));
    }

    fn ambient_frame(&mut self) {
        self.rotation.advance(self.profile.ambient_step);
        self.emit(PresentationEvent::Rotation(self.rotation));
    }

    fn request_spin(&mut self, code: DrawCode, draw: &mut Option<PendingDraw>) {
        if draw.is_some() || self.engine.is_busy() {
            log::warn!("Spin requested before the last one finished, ignored");
            self.emit(PresentationEvent::SpinRejected);
            return;
        }
        if code.is_blank() {
            self.fail(DrawError::EmptyCode.into());
            return;
        }

        log::info!("Drawing for code '{}'", code);
        self.emit(PresentationEvent::Highlight(None));
        *draw = Some(PendingDraw::spawn(self.service.clone(), code));
    }

    fn request_verify(&self, code: DrawCode, verifications: &mut JoinSet<PresentationEvent>) {
        if code.is_blank() {
            self.emit(PresentationEvent::VerifyFailed {
                code,
                reason: DrawError::EmptyCode.to_string(),
            });
            return;
        }

        log::info!("Verifying code '{}'", code);
        let service = self.service.clone();
        verifications.spawn(async move {
            match service.verify_code(code.clone()).await {
                Ok(verification) => PresentationEvent::Verified { code, verification },
                Err(e) => PresentationEvent::VerifyFailed {
                    code,
                    reason: e.to_string(),
                },
            }
        });
    }

    fn on_draw_result(&mut self, result: Result<DrawOutcome, DrawError>) {
        match result
            .map_err(SessionError::from)
            .and_then(|outcome| self.begin_spin(&outcome))
        {
            Ok(target) => log::info!(
                "Spinning towards slot {} ({})",
                target,
                self.pool[target].prize.name
            ),
            Err(e) => self.fail(e),
        }
    }

    fn begin_spin(&mut self, outcome: &DrawOutcome) -> Result<usize, SessionError> {
        if let Some(message) = &outcome.message {
            log::debug!("Draw service says: {}", message);
        }

        let target = sphere::resolve(outcome, &self.catalog, &self.pool, &mut self.rng)?.index();
        self.engine.start(target, self.pool.len())?;
        self.next_tick = Some(Instant::now());
        Ok(target)
    }

    fn fail(&mut self, error: SessionError) {
        log::warn!("Spin failed: {}", error);
        self.engine.reset();
        self.next_tick = None;
        self.emit(PresentationEvent::SpinFailed {
            reason: error.to_string(),
        });

        if std::mem::take(&mut self.reload_deferred) {
            self.reload(false);
        }
    }

    fn spin_tick(&mut self) {
        match self.engine.tick() {
            Some(SpinStep::Tick {
                index,
                rotation,
                delay,
            }) => {
                self.rotation.advance(rotation);
                self.emit(PresentationEvent::Highlight(Some(index)));
                self.emit(PresentationEvent::Rotation(self.rotation));
                self.next_tick = Some(Instant::now() + delay);
            }
            Some(SpinStep::Settled { index }) => {
                self.next_tick = None;
                let entry = &self.pool[index];
                log::info!(
                    "Settled on slot {} ({}, card {})",
                    index,
                    entry.prize.name,
                    entry.display_id
                );
                self.emit(PresentationEvent::Highlight(None));
                self.emit(PresentationEvent::Settled {
                    index,
                    display_id: entry.display_id.clone(),
                });

                if std::mem::take(&mut self.reload_deferred) {
                    self.reload(false);
                }
            }
            None => self.next_tick = None,
        }
    }

    fn reload(&mut self, draw_pending: bool) {
        if draw_pending || self.engine.is_busy() {
            log::info!("Config changed mid-spin, reloading once it settles");
            self.reload_deferred = true;
            return;
        }

        match (self.loader)()
            .map_err(SessionError::from)
            .and_then(|config| self.apply_config(&config))
        {
            Ok(()) => log::info!("Configuration reloaded"),
            Err(e) => log::error!("Failed to reload config: {}", e),
        }
    }

    fn apply_config(&mut self, config: &Config) -> Result<(), SessionError> {
        let profile = config.profile()?;
        let pool = sphere::expand(&config.prizes, profile.pool_length)?;

        self.service.catalog_changed(&config.prizes);
        self.engine = SpinEngine::new(profile.spin_tuning());
        self.profile = profile;
        self.catalog = config.prizes.clone();
        self.pool = pool;
        self.publish_layout();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphere::pool::tests::sample_catalog;
    use crate::sphere::{DisplayId, DisplayMode, PrizeId, PrizeName, Resolution};
    use crate::sys::draw::CodeVerification;
    use parking_lot::Mutex;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    type Script = Arc<Mutex<VecDeque<Result<DrawOutcome, DrawError>>>>;

    /// Answers draws from a fixed script, one entry per request.
    struct ScriptedDraw {
        latency: Duration,
        script: Script,
        requests: Arc<AtomicUsize>,
        known: HashMap<DrawCode, CodeVerification>,
    }

    impl ScriptedDraw {
        fn new(script: Vec<Result<DrawOutcome, DrawError>>) -> Self {
            Self {
                latency: Duration::from_millis(200),
                script: Arc::new(Mutex::new(script.into())),
                requests: Arc::new(AtomicUsize::new(0)),
                known: HashMap::new(),
            }
        }

        fn slow(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        fn knowing(mut self, code: &str, verification: CodeVerification) -> Self {
            self.known.insert(DrawCode::new(code), verification);
            self
        }
    }

    impl DrawService for ScriptedDraw {
        async fn request_draw(&self, _code: DrawCode) -> Result<DrawOutcome, DrawError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            time::sleep(self.latency).await;
            let next = self.script.lock().pop_front();
            next.unwrap_or_else(|| Err(DrawError::Failed("script exhausted".to_string())))
        }

        async fn verify_code(&self, code: DrawCode) -> Result<CodeVerification, DrawError> {
            time::sleep(self.latency).await;
            self.known.get(&code).cloned().ok_or(DrawError::UnknownCode)
        }
    }

    fn full_config(prizes: usize) -> Config {
        Config {
            mode: DisplayMode::Full,
            prizes: sample_catalog(prizes),
            ..Default::default()
        }
    }

    fn compact_loader() -> Result<Config, ConfigError> {
        Ok(Config {
            mode: DisplayMode::Compact,
            prizes: sample_catalog(3),
            ..Default::default()
        })
    }

    struct Harness {
        events: Sender<AppEvent>,
        sink: Receiver<PresentationEvent>,
        handle: JoinHandle<()>,
    }

    impl Harness {
        fn start(
            (session, sink): (Session<ScriptedDraw, StdRng>, Receiver<PresentationEvent>),
        ) -> Self {
            let (events, rx) = async_channel::unbounded();
            let handle = tokio::spawn(session.run(rx));
            Self {
                events,
                sink,
                handle,
            }
        }

        async fn send(&self, event: AppEvent) {
            self.events.send(event).await.unwrap();
        }

        /// Skips ambient noise until an event satisfies `pred`, returning the highlights seen.
        async fn until(
            &self,
            pred: impl Fn(&PresentationEvent) -> bool,
        ) -> (PresentationEvent, Vec<usize>) {
            let mut highlights = Vec::new();
            loop {
                let event = self.sink.recv().await.unwrap();
                if pred(&event) {
                    return (event, highlights);
                }
                if let PresentationEvent::Highlight(Some(i)) = event {
                    highlights.push(i);
                }
            }
        }

        async fn close(self) {
            self.send(AppEvent::Close).await;
            self.handle.await.unwrap();
        }
    }

    fn new_session(
        config: &Config,
        draw: ScriptedDraw,
        seed: u64,
    ) -> (Session<ScriptedDraw, StdRng>, Receiver<PresentationEvent>) {
        let (tx, rx) = async_channel::unbounded();
        let session = Session::new(config, draw, StdRng::seed_from_u64(seed), tx).unwrap();
        (session, rx)
    }

    fn is_settled(event: &PresentationEvent) -> bool {
        matches!(event, PresentationEvent::Settled { .. })
    }

    #[tokio::test(start_paused = true)]
    async fn test_layout_published_first() {
        let harness = Harness::start(new_session(&full_config(5), ScriptedDraw::new(vec![]), 1));

        match harness.sink.recv().await.unwrap() {
            PresentationEvent::Layout(cards) => assert_eq!(cards.len(), 60),
            other => panic!("expected layout, got {:?}", other),
        }
        harness.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_winning_draw_settles_on_prize_slot() {
        let draw = ScriptedDraw::new(vec![Ok(DrawOutcome::winner(3_i64))]);
        let harness = Harness::start(new_session(&full_config(5), draw, 1));

        harness.send(AppEvent::Spin(DrawCode::new("LUCKY"))).await;
        let (settled, highlights) = harness.until(is_settled).await;

        assert_eq!(
            settled,
            PresentationEvent::Settled {
                index: 2,
                display_id: crate::sphere::DisplayId {
                    source: crate::sphere::PrizeId::Number(3),
                    duplicate: 0,
                },
            }
        );
        assert_eq!(highlights.len(), 4 * 60 + 2 + 1);
        assert_eq!(highlights.last(), Some(&2));
        harness.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_losing_draw_settles_on_seeded_random_slot() {
        let config = full_config(5);
        let pool = sphere::expand(&config.prizes, 60).unwrap();
        let expected = sphere::resolve(
            &DrawOutcome::no_win(),
            &config.prizes,
            &pool,
            &mut StdRng::seed_from_u64(11),
        )
        .unwrap();
        assert!(matches!(expected, Resolution::Random(_)));

        let draw = ScriptedDraw::new(vec![Ok(DrawOutcome::no_win())]);
        let harness = Harness::start(new_session(&config, draw, 11));

        harness.send(AppEvent::Spin(DrawCode::new("meh"))).await;
        let (settled, _) = harness.until(is_settled).await;

        match settled {
            PresentationEvent::Settled { index, .. } => {
                assert!(index < 60);
                assert_eq!(index, expected.index());
            }
            other => panic!("expected settle, got {:?}", other),
        }
        harness.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_draw_is_reported_and_retryable() {
        let draw = ScriptedDraw::new(vec![
            Err(DrawError::Failed("code already used".to_string())),
            Ok(DrawOutcome::winner(1_i64)),
        ]);
        let harness = Harness::start(new_session(&full_config(5), draw, 1));

        harness.send(AppEvent::Spin(DrawCode::new("used"))).await;
        let (failed, highlights) = harness
            .until(|e| matches!(e, PresentationEvent::SpinFailed { .. }))
            .await;
        assert!(highlights.is_empty());
        assert_eq!(
            failed,
            PresentationEvent::SpinFailed {
                reason: "Invalid code or error occurred: code already used".to_string()
            }
        );

        // ambient rotation resumes while idle
        harness
            .until(|e| matches!(e, PresentationEvent::Rotation(_)))
            .await;

        harness.send(AppEvent::Spin(DrawCode::new("fresh"))).await;
        let (settled, _) = harness.until(is_settled).await;
        assert!(matches!(
            settled,
            PresentationEvent::Settled { index: 0, .. }
        ));
        harness.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_spin_is_rejected_while_spinning() {
        let draw = ScriptedDraw::new(vec![
            Ok(DrawOutcome::winner(4_i64)),
            Ok(DrawOutcome::winner(1_i64)),
        ]);
        let harness = Harness::start(new_session(&full_config(5), draw, 1));

        harness.send(AppEvent::Spin(DrawCode::new("one"))).await;
        harness
            .until(|e| matches!(e, PresentationEvent::Highlight(Some(_))))
            .await;

        harness.send(AppEvent::Spin(DrawCode::new("two"))).await;
        harness
            .until(|e| matches!(e, PresentationEvent::SpinRejected))
            .await;

        let (settled, _) = harness.until(is_settled).await;
        assert!(matches!(
            settled,
            PresentationEvent::Settled { index: 3, .. }
        ));
        harness.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_spin_rejected_while_draw_pending() {
        let draw = ScriptedDraw::new(vec![Ok(DrawOutcome::winner(2_i64))]);
        let harness = Harness::start(new_session(&full_config(5), draw, 1));

        harness.send(AppEvent::Spin(DrawCode::new("one"))).await;
        harness.send(AppEvent::Spin(DrawCode::new("two"))).await;
        harness
            .until(|e| matches!(e, PresentationEvent::SpinRejected))
            .await;

        let (settled, _) = harness.until(is_settled).await;
        assert!(matches!(
            settled,
            PresentationEvent::Settled { index: 1, .. }
        ));
        harness.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_code_fails_without_request() {
        let harness = Harness::start(new_session(&full_config(5), ScriptedDraw::new(vec![]), 1));

        harness
            .send(AppEvent::Spin(DrawCode::from("   ".to_string())))
            .await;
        let (failed, _) = harness
            .until(|e| matches!(e, PresentationEvent::SpinFailed { .. }))
            .await;

        assert_eq!(
            failed,
            PresentationEvent::SpinFailed {
                reason: "Please enter a code".to_string()
            }
        );
        harness.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_pending_draw() {
        let draw = ScriptedDraw::new(vec![Ok(DrawOutcome::winner(1_i64))])
            .slow(Duration::from_secs(3600));
        let script = draw.script.clone();
        let requests = draw.requests.clone();
        let harness = Harness::start(new_session(&full_config(5), draw, 1));

        harness.send(AppEvent::Spin(DrawCode::new("slow"))).await;
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(requests.load(Ordering::SeqCst), 1);

        let sink = harness.sink.clone();
        harness.close().await;

        // well past the draw latency, the aborted request never took its answer
        time::sleep(Duration::from_secs(7200)).await;
        assert_eq!(script.lock().len(), 1);

        while let Ok(event) = sink.try_recv() {
            assert!(!is_settled(&event));
            assert!(!matches!(event, PresentationEvent::Highlight(Some(_))));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_rebuilds_layout_for_new_profile() {
        let (session, sink) = new_session(&full_config(5), ScriptedDraw::new(vec![]), 1);
        let harness = Harness::start((session.with_loader(compact_loader), sink));

        harness
            .until(|e| matches!(e, PresentationEvent::Layout(_)))
            .await;
        harness.send(AppEvent::ConfigReload).await;

        let (layout, _) = harness
            .until(|e| matches!(e, PresentationEvent::Layout(_)))
            .await;
        match layout {
            PresentationEvent::Layout(cards) => {
                assert_eq!(cards.len(), 30);
                assert!((cards[0].position.y - 120.0).abs() < 1e-9);
            }
            other => panic!("expected layout, got {:?}", other),
        }
        harness.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_waits_for_pending_draw() {
        let draw = ScriptedDraw::new(vec![Ok(DrawOutcome::winner(5_i64))])
            .slow(Duration::from_secs(2));
        let (session, sink) = new_session(&full_config(5), draw, 1);
        let harness = Harness::start((session.with_loader(compact_loader), sink));
        harness
            .until(|e| matches!(e, PresentationEvent::Layout(_)))
            .await;

        harness.send(AppEvent::Spin(DrawCode::new("LUCKY"))).await;
        harness.send(AppEvent::ConfigReload).await;

        let (settled, highlights) = harness
            .until(|e| is_settled(e) || matches!(e, PresentationEvent::Layout(_)))
            .await;
        assert_eq!(
            settled,
            PresentationEvent::Settled {
                index: 4,
                display_id: DisplayId {
                    source: PrizeId::Number(5),
                    duplicate: 0,
                },
            }
        );
        assert_eq!(highlights.len(), 4 * 60 + 4 + 1);

        let (layout, _) = harness
            .until(|e| matches!(e, PresentationEvent::Layout(_)))
            .await;
        assert!(matches!(layout, PresentationEvent::Layout(cards) if cards.len() == 30));
        harness.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_deferred_by_draw_applies_after_failure() {
        let draw = ScriptedDraw::new(vec![Err(DrawError::Failed("expired".to_string()))])
            .slow(Duration::from_secs(2));
        let (session, sink) = new_session(&full_config(5), draw, 1);
        let harness = Harness::start((session.with_loader(compact_loader), sink));
        harness
            .until(|e| matches!(e, PresentationEvent::Layout(_)))
            .await;

        harness.send(AppEvent::Spin(DrawCode::new("old"))).await;
        harness.send(AppEvent::ConfigReload).await;

        let (failed, _) = harness
            .until(|e| {
                matches!(
                    e,
                    PresentationEvent::SpinFailed { .. } | PresentationEvent::Layout(_)
                )
            })
            .await;
        assert!(matches!(failed, PresentationEvent::SpinFailed { .. }));

        let (layout, _) = harness
            .until(|e| matches!(e, PresentationEvent::Layout(_)))
            .await;
        assert!(matches!(layout, PresentationEvent::Layout(cards) if cards.len() == 30));
        harness.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_ambient_rotation_paused_while_drawing_and_spinning() {
        let draw = ScriptedDraw::new(vec![Ok(DrawOutcome::winner(2_i64))]);
        let harness = Harness::start(new_session(&full_config(5), draw, 1));

        harness.send(AppEvent::Spin(DrawCode::new("LUCKY"))).await;
        harness
            .until(|e| matches!(e, PresentationEvent::Highlight(None)))
            .await;

        // spin rotations always follow their highlight, ambient ones never do
        let mut previous = PresentationEvent::Highlight(None);
        loop {
            let event = harness.sink.recv().await.unwrap();
            if is_settled(&event) {
                break;
            }
            if matches!(event, PresentationEvent::Rotation(_)) {
                assert!(
                    matches!(previous, PresentationEvent::Highlight(Some(_))),
                    "ambient rotation while busy"
                );
            }
            previous = event;
        }

        let (_, highlights) = harness
            .until(|e| matches!(e, PresentationEvent::Rotation(_)))
            .await;
        assert!(highlights.is_empty());
        harness.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_sink_does_not_stall_session() {
        let (tx, sink) = async_channel::bounded(1);
        let draw = ScriptedDraw::new(vec![Ok(DrawOutcome::winner(1_i64))]);
        let session = Session::new(&full_config(5), draw, StdRng::seed_from_u64(1), tx).unwrap();
        let (events, rx) = async_channel::unbounded();
        let handle = tokio::spawn(session.run(rx));

        events
            .send(AppEvent::Spin(DrawCode::new("LUCKY")))
            .await
            .unwrap();
        time::sleep(Duration::from_secs(5)).await;
        events.send(AppEvent::Close).await.unwrap();
        handle.await.unwrap();

        assert!(matches!(sink.try_recv(), Ok(PresentationEvent::Layout(_))));
        assert!(sink.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_reports_code_results() {
        let won = CodeVerification {
            is_winner: true,
            prize_name: Some(PrizeName::new("Prize 2")),
            prize_description: None,
            prize_image: None,
            message: Some("Valid prize code".to_string()),
        };
        let draw = ScriptedDraw::new(vec![]).knowing("WON", won.clone());
        let harness = Harness::start(new_session(&full_config(5), draw, 1));

        harness
            .send(AppEvent::Verify(DrawCode::from("  ".to_string())))
            .await;
        let (blank, _) = harness
            .until(|e| matches!(e, PresentationEvent::VerifyFailed { .. }))
            .await;
        assert!(matches!(
            blank,
            PresentationEvent::VerifyFailed { reason, .. } if reason == "Please enter a code"
        ));

        harness.send(AppEvent::Verify(DrawCode::new("WON"))).await;
        let (verified, _) = harness
            .until(|e| matches!(e, PresentationEvent::Verified { .. }))
            .await;
        assert_eq!(
            verified,
            PresentationEvent::Verified {
                code: DrawCode::new("WON"),
                verification: won,
            }
        );

        harness.send(AppEvent::Verify(DrawCode::new("NOPE"))).await;
        let (unknown, _) = harness
            .until(|e| matches!(e, PresentationEvent::VerifyFailed { .. }))
            .await;
        assert_eq!(
            unknown,
            PresentationEvent::VerifyFailed {
                code: DrawCode::new("NOPE"),
                reason: "Invalid or unused code".to_string(),
            }
        );
        harness.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_during_spin_leaves_spin_alone() {
        let draw = ScriptedDraw::new(vec![Ok(DrawOutcome::winner(3_i64))]);
        let harness = Harness::start(new_session(&full_config(5), draw, 1));

        harness.send(AppEvent::Spin(DrawCode::new("LUCKY"))).await;
        harness
            .until(|e| matches!(e, PresentationEvent::Highlight(Some(_))))
            .await;
        harness.send(AppEvent::Verify(DrawCode::new("OTHER"))).await;

        let mut verified = false;
        loop {
            match harness.sink.recv().await.unwrap() {
                PresentationEvent::VerifyFailed { .. } => verified = true,
                PresentationEvent::SpinRejected => panic!("verification rejected the spin"),
                PresentationEvent::Settled { index, .. } => {
                    assert_eq!(index, 2);
                    break;
                }
                _ => {}
            }
        }
        assert!(verified);
        harness.close().await;
    }

    #[test]
    fn test_empty_catalog_blocks_session() {
        let (tx, _rx) = async_channel::unbounded();
        let result = Session::new(
            &full_config(0),
            ScriptedDraw::new(vec![]),
            StdRng::seed_from_u64(1),
            tx,
        );

        assert!(matches!(
            result,
            Err(SessionError::Expand(ExpandError::EmptyCatalog))
        ));
    }
}
