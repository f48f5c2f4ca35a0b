use super::MAX_STEP_SECONDS;
use super::error::GameError;

#[derive(Debug, Clone, Copy)]
pub struct ClockSettings {
    pub start_year: i32,
    pub years_per_second: f64,
    pub default_speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            start_year: 1800,
            years_per_second: 0.1,
            default_speed: 1.0,
            min_speed: 0.25,
            max_speed: 16.0,
        }
    }
}

/// 1チャンク分の経過。`seconds` は倍率適用後の実効秒。
#[derive(Debug, Clone, Default)]
pub struct TickChunk {
    pub seconds: f64,
    pub crossed_years: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct SimulationClock {
    current_year: i32,
    year_progress: f64,
    years_per_second: f64,
    time_multiplier: f64,
    min_multiplier: f64,
    max_multiplier: f64,
    default_multiplier: f64,
    start_year: i32,
    paused: bool,
}

impl SimulationClock {
    pub(crate) fn new(settings: ClockSettings) -> Self {
        let fallback = ClockSettings::default();
        let years_per_second =
            if settings.years_per_second.is_finite() && settings.years_per_second > 0.0 {
                settings.years_per_second
            } else {
                fallback.years_per_second
            };
        let min_multiplier = if settings.min_speed.is_finite() && settings.min_speed > 0.0 {
            settings.min_speed
        } else {
            fallback.min_speed
        };
        let max_multiplier = settings.max_speed.max(min_multiplier);
        let default_multiplier = settings.default_speed.clamp(min_multiplier, max_multiplier);
        Self {
            current_year: settings.start_year,
            year_progress: 0.0,
            years_per_second,
            time_multiplier: default_multiplier,
            min_multiplier,
            max_multiplier,
            default_multiplier,
            start_year: settings.start_year,
            paused: false,
        }
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn year_progress_percent(&self) -> f64 {
        self.year_progress * 100.0
    }

    pub fn seconds_per_year(&self) -> f64 {
        1.0 / self.years_per_second
    }

    pub fn time_multiplier(&self) -> f64 {
        self.time_multiplier
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn set_speed(&mut self, multiplier: f64) -> Result<f64, GameError> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(GameError::InvalidTimeInput { value: multiplier });
        }
        self.time_multiplier = multiplier.clamp(self.min_multiplier, self.max_multiplier);
        Ok(self.time_multiplier)
    }

    /// 実時間をチャンク列に変換する。1チャンクは `MAX_STEP_SECONDS` 以下に抑え、
    /// 大きな経過時間でも年越えを1つずつ報告する。
    pub(crate) fn advance(&mut self, real_seconds: f64) -> Result<Vec<TickChunk>, GameError> {
        if !real_seconds.is_finite() || real_seconds < 0.0 {
            return Err(GameError::InvalidTimeInput {
                value: real_seconds,
            });
        }
        if self.paused || real_seconds == 0.0 {
            return Ok(Vec::new());
        }

        let mut remaining = real_seconds * self.time_multiplier;
        let mut chunks = Vec::new();
        while remaining > 0.0 {
            let step = remaining.min(MAX_STEP_SECONDS);
            remaining -= step;

            let mut crossed_years = Vec::new();
            self.year_progress += step * self.years_per_second;
            while self.year_progress >= 1.0 {
                self.year_progress -= 1.0;
                self.current_year += 1;
                crossed_years.push(self.current_year);
            }
            chunks.push(TickChunk {
                seconds: step,
                crossed_years,
            });
        }
        Ok(chunks)
    }

    pub(crate) fn set_year(&mut self, year: i32) {
        self.current_year = year;
        self.year_progress = 0.0;
    }

    pub(crate) fn reset(&mut self) {
        self.current_year = self.start_year;
        self.year_progress = 0.0;
        self.time_multiplier = self.default_multiplier;
        self.paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> SimulationClock {
        SimulationClock::new(ClockSettings::default())
    }

    fn total_seconds(chunks: &[TickChunk]) -> f64 {
        chunks.iter().map(|chunk| chunk.seconds).sum()
    }

    #[test]
    fn advance_crosses_year_after_configured_seconds() {
        let mut clock = clock();
        let chunks = clock.advance(10.5).expect("advance");
        assert!((total_seconds(&chunks) - 10.5).abs() < 1e-9);
        assert_eq!(clock.current_year(), 1801);
        let crossed: Vec<i32> = chunks
            .iter()
            .flat_map(|chunk| chunk.crossed_years.clone())
            .collect();
        assert_eq!(crossed, vec![1801]);
    }

    #[test]
    fn large_delta_is_chunked_without_skipping_years() {
        let mut clock = clock();
        let chunks = clock.advance(35.0).expect("advance");
        assert!(chunks.len() >= 35);
        assert!(chunks.iter().all(|chunk| chunk.seconds <= MAX_STEP_SECONDS));
        let crossed: Vec<i32> = chunks
            .iter()
            .flat_map(|chunk| chunk.crossed_years.clone())
            .collect();
        assert_eq!(crossed, vec![1801, 1802, 1803]);
        assert_eq!(clock.current_year(), 1803);
    }

    #[test]
    fn multiplier_scales_effective_seconds() {
        let mut clock = clock();
        clock.set_speed(2.0).expect("speed");
        let chunks = clock.advance(5.5).expect("advance");
        assert!((total_seconds(&chunks) - 11.0).abs() < 1e-9);
        assert_eq!(clock.current_year(), 1801);
    }

    #[test]
    fn set_speed_clamps_to_bounds() {
        let mut clock = clock();
        assert_eq!(clock.set_speed(100.0).expect("max"), 16.0);
        assert_eq!(clock.set_speed(0.01).expect("min"), 0.25);
        assert!(matches!(
            clock.set_speed(f64::NAN),
            Err(GameError::InvalidTimeInput { .. })
        ));
    }

    #[test]
    fn paused_clock_produces_no_chunks() {
        let mut clock = clock();
        assert!(clock.toggle_pause());
        let chunks = clock.advance(10.0).expect("advance");
        assert!(chunks.is_empty());
        assert_eq!(clock.current_year(), 1800);
        assert!(!clock.toggle_pause());
    }

    #[test]
    fn negative_delta_is_rejected() {
        let mut clock = clock();
        assert!(matches!(
            clock.advance(-1.0),
            Err(GameError::InvalidTimeInput { .. })
        ));
    }

    #[test]
    fn reset_restores_start_state() {
        let mut clock = clock();
        clock.set_speed(4.0).expect("speed");
        clock.advance(25.0).expect("advance");
        clock.toggle_pause();
        clock.reset();
        assert_eq!(clock.current_year(), 1800);
        assert_eq!(clock.time_multiplier(), 1.0);
        assert!(!clock.is_paused());
        assert_eq!(clock.year_progress_percent(), 0.0);
    }
}
