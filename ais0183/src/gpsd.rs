//! Mapping of decoded records into the gpsd AIS JSON schema.
//!
//! gpsd publishes AIS reports with its own field names (`lon`/`lat` instead
//! of `x`/`y`, `course` instead of `cog`, and so on) plus human readable
//! companion strings for enumerated fields. [`mangle`] is a pure transform
//! from an [`AisRecord`] to that schema: a fixed table per message id, no
//! state.

use serde_json::{json, Map, Value};

use crate::decoder::{
    AisMessage, BaseStationReport, ClassBPositionReport, LongRangeReport, PositionReport,
    StaticDataReport, StaticVoyageData,
};
use crate::envelope::AisRecord;

const NAV_STATUSES: [&str; 16] = [
    "Under way using engine",
    "At anchor",
    "Not under command",
    "Restricted manoeuverability",
    "Constrained by her draught",
    "Moored",
    "Aground",
    "Engaged in fishing",
    "Under way sailing",
    "Reserved for HSC",
    "Reserved for WIG",
    "Reserved",
    "Reserved",
    "Reserved",
    "Reserved",
    "Not defined",
];

const FIX_TYPES: [&str; 9] = [
    "Undefined",
    "GPS",
    "GLONASS",
    "Combined GPS/GLONASS",
    "Loran-C",
    "Chayka",
    "Integrated navigation system",
    "Surveyed",
    "Galileo",
];

fn nav_status_text(status: u32) -> &'static str {
    NAV_STATUSES
        .get(status as usize)
        .copied()
        .unwrap_or(NAV_STATUSES[15])
}

fn fix_type_text(fix_type: u32) -> &'static str {
    FIX_TYPES.get(fix_type as usize).copied().unwrap_or(FIX_TYPES[0])
}

fn ship_type_text(code: u32) -> String {
    let special = match code {
        0 => Some("Not available"),
        1..=19 => Some("Reserved for future use"),
        30 => Some("Fishing"),
        31 => Some("Towing"),
        32 => Some("Towing: length exceeds 200m or breadth exceeds 25m"),
        33 => Some("Dredging or underwater ops"),
        34 => Some("Diving ops"),
        35 => Some("Military ops"),
        36 => Some("Sailing"),
        37 => Some("Pleasure Craft"),
        38 | 39 => Some("Reserved"),
        50 => Some("Pilot Vessel"),
        51 => Some("Search and Rescue vessel"),
        52 => Some("Tug"),
        53 => Some("Port Tender"),
        54 => Some("Anti-pollution equipment"),
        55 => Some("Law Enforcement"),
        56 | 57 => Some("Spare - Local Vessel"),
        58 => Some("Medical Transport"),
        59 => Some("Noncombatant ship according to RR Resolution No. 18"),
        _ => None,
    };
    if let Some(text) = special {
        return text.to_string();
    }

    let category = match code / 10 {
        2 => "Wing in ground (WIG)",
        4 => "High speed craft (HSC)",
        6 => "Passenger",
        7 => "Cargo",
        8 => "Tanker",
        9 => "Other Type",
        _ => return format!("{} - Unknown", code),
    };
    let detail = match code % 10 {
        0 => "all ships of this type",
        1 => "Hazardous category A",
        2 => "Hazardous category B",
        3 => "Hazardous category C",
        4 => "Hazardous category D",
        9 if code >= 40 => "No additional information",
        _ => "Reserved for future use",
    };
    format!("{}, {}", category, detail)
}

// gpsd strips the `@` padding and surrounding blanks from string fields.
fn strip_padding(text: &str) -> String {
    text.trim_matches('@').trim().to_string()
}

fn base(res: &mut Map<String, Value>, record: &AisRecord) {
    res.insert("class".to_string(), json!("AIS"));
    res.insert("device".to_string(), json!("stdin"));
    res.insert("scaled".to_string(), json!(true));
    res.insert("type".to_string(), json!(record.message.id()));
    res.insert("mmsi".to_string(), json!(record.message.mmsi()));
    res.insert("md5".to_string(), json!(record.md5));
}

fn position(res: &mut Map<String, Value>, m: &PositionReport) {
    res.insert("repeat".to_string(), json!(m.repeat_indicator));
    res.insert("status".to_string(), json!(m.nav_status));
    res.insert(
        "status_text".to_string(),
        json!(nav_status_text(m.nav_status)),
    );
    let turn = if m.rot_over_range {
        Value::Null
    } else {
        json!(m.rot)
    };
    res.insert("turn".to_string(), turn);
    res.insert("speed".to_string(), json!(m.sog));
    res.insert("accuracy".to_string(), json!(m.position_accuracy == 1));
    res.insert("lon".to_string(), json!(m.x));
    res.insert("lat".to_string(), json!(m.y));
    res.insert("course".to_string(), json!(m.cog));
    res.insert("heading".to_string(), json!(m.true_heading));
    res.insert("second".to_string(), json!(m.timestamp));
    res.insert("maneuver".to_string(), json!(m.special_manoeuvre));
    res.insert("raim".to_string(), json!(m.raim));
}

fn base_station(res: &mut Map<String, Value>, m: &BaseStationReport) {
    res.insert("repeat".to_string(), json!(m.repeat_indicator));
    res.insert(
        "timestamp".to_string(),
        json!(format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            m.year, m.month, m.day, m.hour, m.minute, m.second
        )),
    );
    res.insert("epfd".to_string(), json!(m.fix_type));
    res.insert("epfd_text".to_string(), json!(fix_type_text(m.fix_type)));
    res.insert("accuracy".to_string(), json!(m.position_accuracy == 1));
    res.insert("lon".to_string(), json!(m.x));
    res.insert("lat".to_string(), json!(m.y));
    res.insert("raim".to_string(), json!(m.raim));
}

fn static_voyage(res: &mut Map<String, Value>, m: &StaticVoyageData) {
    res.insert("repeat".to_string(), json!(m.repeat_indicator));
    res.insert("ais_version".to_string(), json!(m.ais_version));
    res.insert("imo".to_string(), json!(m.imo_num.to_string()));
    res.insert("callsign".to_string(), json!(strip_padding(&m.callsign)));
    res.insert("shipname".to_string(), json!(strip_padding(&m.name)));
    res.insert("shiptype".to_string(), json!(m.type_and_cargo));
    res.insert(
        "shiptype_text".to_string(),
        json!(ship_type_text(m.type_and_cargo)),
    );
    res.insert("to_bow".to_string(), json!(m.dim_a));
    res.insert("to_stern".to_string(), json!(m.dim_b));
    res.insert("to_port".to_string(), json!(m.dim_c));
    res.insert("to_starboard".to_string(), json!(m.dim_d));
    res.insert("epfd".to_string(), json!(m.fix_type));
    res.insert("epfd_text".to_string(), json!(fix_type_text(m.fix_type)));
    if (1..=12).contains(&m.eta_month)
        && (1..=31).contains(&m.eta_day)
        && m.eta_hour < 24
        && m.eta_minute < 60
    {
        res.insert(
            "eta".to_string(),
            json!(format!(
                "{:02}-{:02}T{:02}:{:02}Z",
                m.eta_month, m.eta_day, m.eta_hour, m.eta_minute
            )),
        );
    }
    res.insert("draught".to_string(), json!(m.draught));
    res.insert(
        "destination".to_string(),
        json!(strip_padding(&m.destination)),
    );
    res.insert("dte".to_string(), json!(m.dte));
}

fn class_b(res: &mut Map<String, Value>, m: &ClassBPositionReport) {
    res.insert("repeat".to_string(), json!(m.repeat_indicator));
    res.insert("reserved".to_string(), json!(m.spare));
    res.insert("speed".to_string(), json!(m.sog));
    res.insert("accuracy".to_string(), json!(m.position_accuracy == 1));
    res.insert("lon".to_string(), json!(m.x));
    res.insert("lat".to_string(), json!(m.y));
    res.insert("course".to_string(), json!(m.cog));
    res.insert("heading".to_string(), json!(m.true_heading));
    res.insert("second".to_string(), json!(m.timestamp));
    res.insert("regional".to_string(), json!(m.spare2));
    res.insert("cs".to_string(), json!(m.commstate_flag == 1));
    res.insert("display".to_string(), json!(m.display_flag == 1));
    res.insert("dsc".to_string(), json!(m.dsc_flag == 1));
    res.insert("band".to_string(), json!(m.band_flag == 1));
    res.insert("msg22".to_string(), json!(m.m22_flag == 1));
    res.insert("raim".to_string(), json!(m.raim));
}

fn static_data(res: &mut Map<String, Value>, m: &StaticDataReport) {
    res.insert("repeat".to_string(), json!(m.repeat_indicator));
    res.insert("part".to_string(), json!(m.part_num));
    if let Some(name) = &m.name {
        res.insert("shipname".to_string(), json!(strip_padding(name)));
    }
    if let Some(shiptype) = m.type_and_cargo {
        res.insert("shiptype".to_string(), json!(shiptype));
        res.insert("shiptype_text".to_string(), json!(ship_type_text(shiptype)));
    }
    if let Some(vendor_id) = &m.vendor_id {
        res.insert("vendorid".to_string(), json!(strip_padding(vendor_id)));
    }
    if let Some(callsign) = &m.callsign {
        res.insert("callsign".to_string(), json!(strip_padding(callsign)));
    }
    if let (Some(a), Some(b), Some(c), Some(d)) = (m.dim_a, m.dim_b, m.dim_c, m.dim_d) {
        res.insert("to_bow".to_string(), json!(a));
        res.insert("to_stern".to_string(), json!(b));
        res.insert("to_port".to_string(), json!(c));
        res.insert("to_starboard".to_string(), json!(d));
    }
}

fn long_range(res: &mut Map<String, Value>, m: &LongRangeReport) {
    res.insert("repeat".to_string(), json!(m.repeat_indicator));
    res.insert("status".to_string(), json!(m.nav_status));
    res.insert(
        "status_text".to_string(),
        json!(nav_status_text(m.nav_status)),
    );
    res.insert("accuracy".to_string(), json!(m.position_accuracy == 1));
    res.insert("lon".to_string(), json!(m.x));
    res.insert("lat".to_string(), json!(m.y));
    res.insert("speed".to_string(), json!(m.sog));
    res.insert("course".to_string(), json!(m.cog));
    res.insert("gnss".to_string(), json!(m.gnss));
    res.insert("raim".to_string(), json!(m.raim));
}

/// Map one decoded record to a gpsd-schema JSON object.
pub fn mangle(record: &AisRecord) -> Value {
    let mut res = Map::new();
    base(&mut res, record);
    match &record.message {
        AisMessage::Position(m) => position(&mut res, m),
        AisMessage::BaseStation(m) => base_station(&mut res, m),
        AisMessage::StaticVoyage(m) => static_voyage(&mut res, m),
        AisMessage::ClassBPosition(m) => class_b(&mut res, m),
        AisMessage::StaticData(m) => static_data(&mut res, m),
        AisMessage::LongRange(m) => long_range(&mut res, m),
    }
    Value::Object(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder;

    fn record(body: &str, fill_bits: u32) -> AisRecord {
        AisRecord::new(body, decoder::decode(body, fill_bits).expect("decode"))
    }

    #[test]
    fn test_position_report_fields() {
        let out = mangle(&record("23?up2001gGRju>Ap:;R2APP08:c", 0));
        assert_eq!(out["class"], "AIS");
        assert_eq!(out["device"], "stdin");
        assert_eq!(out["scaled"], true);
        assert_eq!(out["type"], 2);
        assert_eq!(out["mmsi"], 218069000);
        assert_eq!(out["status"], 0);
        assert_eq!(out["status_text"], "Under way using engine");
        assert_eq!(out["heading"], 48);
        assert_eq!(out["accuracy"], false);
        assert_eq!(out["course"].as_f64().expect("course"), 52.1);
        assert!(out["lon"].as_f64().expect("lon") < -118.0);
    }

    #[test]
    fn test_static_voyage_fields() {
        let out = mangle(&record(
            "55NJPwP00001L@K?77@DhhU>0@5HU>222222220O18@374B<08CCm2EPH0kkUQCU8888880",
            2,
        ));
        assert_eq!(out["type"], 5);
        assert_eq!(out["shipname"], "ELLIS DAVIS");
        assert_eq!(out["callsign"], "WDF3114");
        assert_eq!(out["destination"], "MOTIVA CONVENT");
        assert_eq!(out["shiptype"], 31);
        assert_eq!(out["shiptype_text"], "Towing");
        assert_eq!(out["to_bow"], 9);
        assert_eq!(out["epfd_text"], "GPS");
        assert_eq!(out["eta"], "01-04T12:00Z");
    }

    #[test]
    fn test_long_range_fields() {
        let out = mangle(&record("K8VSqb9LdU28WP8<", 0));
        assert_eq!(out["type"], 27);
        assert_eq!(out["status"], 5);
        assert_eq!(out["status_text"], "Moored");
        assert_eq!(out["gnss"], true);
        assert_eq!(out["speed"], 0);
        assert_eq!(out["course"], 131);
        assert_eq!(out["md5"], "50898a3435865cf76f1b502b2821672b");
    }

    #[test]
    fn test_ship_type_text_categories() {
        assert_eq!(ship_type_text(0), "Not available");
        assert_eq!(ship_type_text(37), "Pleasure Craft");
        assert_eq!(
            ship_type_text(71),
            "Cargo, Hazardous category A"
        );
        assert_eq!(
            ship_type_text(80),
            "Tanker, all ships of this type"
        );
        assert_eq!(ship_type_text(150), "150 - Unknown");
    }
}
