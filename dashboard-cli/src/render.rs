use chrono::{DateTime, FixedOffset, Utc};
use dashboard_core::{
    Position, Units,
    model::{AirPollutionResponse, OneCallResponse, aqi_label},
};

fn local_time(ts: i64, offset_secs: i64) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(i32::try_from(offset_secs).ok()?)?;
    DateTime::<Utc>::from_timestamp(ts, 0).map(|dt| dt.with_timezone(&offset))
}

fn describe(conditions: &[dashboard_core::model::WeatherCondition]) -> &str {
    conditions.first().map(|w| w.description.as_str()).unwrap_or("unknown")
}

pub fn position(name: Option<&str>, position: &Position) {
    match name {
        Some(name) => println!("📍 {name} ({position})"),
        None => println!("📍 {position}"),
    }
}

pub fn weather(w: &OneCallResponse, units: Units) {
    let t = units.temperature_suffix();
    let c = &w.current;

    println!();
    println!("Now: {:.1}{t} (feels like {:.1}{t}), {}", c.temp, c.feels_like, describe(&c.weather));
    println!(
        "     humidity {}%, pressure {} hPa, wind {:.1} {}",
        c.humidity,
        c.pressure,
        c.wind_speed,
        units.speed_suffix()
    );

    let sun = c.sunrise.and_then(|r| local_time(r, w.timezone_offset)).zip(
        c.sunset.and_then(|s| local_time(s, w.timezone_offset)),
    );
    if let Some((rise, set)) = sun {
        println!("     sunrise {}, sunset {}", rise.format("%H:%M"), set.format("%H:%M"));
    }

    if !w.daily.is_empty() {
        println!();
        println!("Forecast:");
        for day in &w.daily {
            let date = local_time(day.dt, w.timezone_offset)
                .map(|d| d.format("%a %d %b").to_string())
                .unwrap_or_else(|| day.dt.to_string());
            let pop = day.pop.map(|p| format!(", {:.0}% rain", p * 100.0)).unwrap_or_default();
            println!(
                "  {date:<11} {:>6.1}{t} / {:>6.1}{t}  {}{pop}",
                day.temp.max,
                day.temp.min,
                describe(&day.weather)
            );
        }
    }

    for alert in &w.alerts {
        println!();
        println!("⚠ {} ({})", alert.event, alert.sender_name);
    }
}

pub fn air(air: &AirPollutionResponse) {
    let Some(entry) = air.latest() else {
        println!("No air quality data available.");
        return;
    };

    let c = &entry.components;
    println!();
    println!("Air quality: {} ({}/5)", aqi_label(entry.main.aqi), entry.main.aqi);
    println!(
        "  PM2.5 {:.1}  PM10 {:.1}  O3 {:.1}  NO2 {:.1}  SO2 {:.1}  CO {:.1}  (μg/m³)",
        c.pm2_5, c.pm10, c.o3, c.no2, c.so2, c.co
    );
}
