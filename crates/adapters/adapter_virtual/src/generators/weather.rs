//! Outdoor conditions and five-day forecast feed.

use chrono::TimeDelta;
use homebus_domain::payload::{ForecastDayPayload, Payload, WeatherPayload};
use homebus_domain::time::WallClock;
use homebus_domain::weather::SkyCondition;
use rand::Rng;
use rand::rngs::StdRng;

/// Number of days in the forecast.
pub const FORECAST_DAYS: i64 = 5;

#[derive(Debug, Clone, Copy, Default)]
pub struct WeatherGenerator;

impl WeatherGenerator {
    /// Current conditions followed by the forecast.
    pub fn tick(self, rng: &mut StdRng, now: WallClock) -> [Payload; 2] {
        let temp: i32 = rng.gen_range(0..=35);
        let condition = SkyCondition::from_temperature(f64::from(temp));
        let current = WeatherPayload {
            temp: Some(f64::from(temp)),
            condition: Some(condition),
            icon: Some(condition.icon().to_string()),
            humidity: Some(f64::from(rng.gen_range(0_u8..100))),
            wind_speed: Some(f64::from(rng.gen_range(0_u8..30))),
        };

        let forecast = (1..=FORECAST_DAYS)
            .map(|offset| {
                let day_temp = f64::from(temp + rng.gen_range(-5..5));
                let condition = SkyCondition::from_temperature(day_temp);
                ForecastDayPayload {
                    date: Some(
                        (now + TimeDelta::days(offset))
                            .format("%a, %b %-d")
                            .to_string(),
                    ),
                    temp: Some(day_temp),
                    condition: Some(condition),
                    icon: Some(condition.icon().to_string()),
                }
            })
            .collect();

        [Payload::Weather(current), Payload::Forecast(forecast)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::SeedableRng;

    fn friday() -> WallClock {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn should_derive_condition_from_temperature() {
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..100 {
            let [Payload::Weather(current), _] = WeatherGenerator.tick(&mut rng, friday()) else {
                panic!("expected weather payload");
            };
            let temp = current.temp.unwrap();
            assert!((0.0..=35.0).contains(&temp));
            assert_eq!(current.condition, Some(SkyCondition::from_temperature(temp)));
            assert!((0.0..100.0).contains(&current.humidity.unwrap()));
            assert!((0.0..30.0).contains(&current.wind_speed.unwrap()));
        }
    }

    #[test]
    fn should_forecast_five_days_starting_tomorrow() {
        let mut rng = StdRng::seed_from_u64(21);
        let [Payload::Weather(current), Payload::Forecast(days)] =
            WeatherGenerator.tick(&mut rng, friday())
        else {
            panic!("expected weather and forecast");
        };

        assert_eq!(days.len(), 5);
        assert_eq!(days[0].date.as_deref(), Some("Sat, Mar 2"));
        assert_eq!(days[4].date.as_deref(), Some("Wed, Mar 6"));
        let temp = current.temp.unwrap();
        for day in &days {
            let delta = day.temp.unwrap() - temp;
            assert!((-5.0..5.0).contains(&delta), "{delta}");
        }
    }
}
