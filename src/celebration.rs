use rand::seq::SliceRandom;
use rand::Rng;
use std::time::{Duration, Instant};

const SPARKS: [char; 6] = ['*', '+', '✦', '✧', '·', '★'];
const CHEERS: [&str; 4] = ["NEW HIGH SCORE!", "UNLOCKED!", "SHARP!", "WELL SPOTTED!"];
const GRAVITY: f64 = 12.0;

/// One spark of the fireworks burst
#[derive(Debug, Clone)]
pub struct Spark {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
}

impl Spark {
    fn launch<R: Rng>(x: f64, y: f64, rng: &mut R) -> Self {
        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
        let speed = rng.gen_range(4.0..9.0);
        Self {
            x,
            y,
            vel_x: angle.cos() * speed * 2.0, // cells are twice as tall as wide
            vel_y: angle.sin() * speed,
            symbol: *SPARKS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(1.0..2.5),
        }
    }

    /// Returns false once the spark burned out
    fn update(&mut self, dt: f64) -> bool {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.vel_y += GRAVITY * dt;
        self.age += dt;
        self.age < self.max_age
    }

    /// 1.0 when fresh, 0.0 when burned out
    pub fn brightness(&self) -> f64 {
        (1.0 - self.age / self.max_age).clamp(0.0, 1.0)
    }
}

/// Fireworks shown over the game-over screen for a high score or an unlock
#[derive(Debug)]
pub struct Celebration {
    pub sparks: Vec<Spark>,
    pub banner: Option<&'static str>,
    pub is_active: bool,
    started_at: Instant,
    duration: Duration,
    width: f64,
    height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self {
            sparks: Vec::new(),
            banner: None,
            is_active: false,
            started_at: Instant::now(),
            duration: Duration::from_secs(3),
            width: 80.0,
            height: 24.0,
        }
    }

    pub fn start(&mut self, width: u16, height: u16, new_high_score: bool) {
        let mut rng = rand::thread_rng();

        self.width = width as f64;
        self.height = height as f64;
        self.started_at = Instant::now();
        self.is_active = true;
        self.banner = Some(if new_high_score {
            CHEERS[0]
        } else {
            *CHEERS[1..].choose(&mut rng).unwrap_or(&CHEERS[1])
        });

        self.sparks.clear();
        for burst in 0..3 {
            let x = self.width * (burst as f64 + 1.0) / 4.0;
            let y = self.height / 3.0;
            self.sparks
                .extend((0..20).map(|_| Spark::launch(x, y, &mut rng)));
        }
    }

    /// Advance by one redraw tick of `dt` seconds
    pub fn update(&mut self, dt: f64) {
        if !self.is_active {
            return;
        }
        if self.started_at.elapsed() >= self.duration {
            self.stop();
            return;
        }

        let (width, height) = (self.width, self.height);
        self.sparks.retain_mut(|spark| {
            spark.update(dt) && spark.x >= 0.0 && spark.x < width && spark.y < height
        });
    }

    pub fn stop(&mut self) {
        self.is_active = false;
        self.banner = None;
        self.sparks.clear();
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_inactive() {
        let celebration = Celebration::new();
        assert!(!celebration.is_active);
        assert!(celebration.sparks.is_empty());
        assert!(celebration.banner.is_none());
    }

    #[test]
    fn start_launches_bursts() {
        let mut celebration = Celebration::new();
        celebration.start(80, 24, true);

        assert!(celebration.is_active);
        assert_eq!(celebration.sparks.len(), 60);
        assert_eq!(celebration.banner, Some("NEW HIGH SCORE!"));
    }

    #[test]
    fn unlock_banner_is_not_the_high_score_one() {
        let mut celebration = Celebration::new();
        for _ in 0..10 {
            celebration.start(80, 24, false);
            assert_ne!(celebration.banner, Some("NEW HIGH SCORE!"));
        }
    }

    #[test]
    fn sparks_fall_and_burn_out() {
        let mut spark = Spark::launch(10.0, 10.0, &mut rand::thread_rng());
        let vel_y = spark.vel_y;

        assert!(spark.update(0.1));
        assert!(spark.vel_y > vel_y);
        assert!(spark.brightness() < 1.0);

        while spark.update(0.1) {}
        assert_eq!(spark.brightness(), 0.0);
    }

    #[test]
    fn sparks_leaving_the_screen_are_dropped() {
        let mut celebration = Celebration::new();
        celebration.start(20, 10, false);
        celebration
            .sparks
            .push(Spark::launch(500.0, 500.0, &mut rand::thread_rng()));

        celebration.update(0.1);

        assert!(celebration
            .sparks
            .iter()
            .all(|s| s.x >= 0.0 && s.x < 20.0 && s.y < 10.0));
    }

    #[test]
    fn stop_clears_everything() {
        let mut celebration = Celebration::new();
        celebration.start(80, 24, true);
        celebration.stop();

        assert!(!celebration.is_active);
        assert!(celebration.sparks.is_empty());
        celebration.update(0.1);
        assert!(celebration.sparks.is_empty());
    }
}
