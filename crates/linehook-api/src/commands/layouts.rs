//! Static reply content.

use serde_json::{json, Value};

/// Postback data carried by the reservation picker.
pub const RESERVE_ACTION_DATA: &str = "action=reserve";

/// Prompt sent before the reservation form and when no time was picked.
pub const RESERVATION_PROMPT: &str = "Please pick a date and time for your reservation.";

/// Alt text for the reservation form.
pub const RESERVATION_ALT_TEXT: &str = "Reservation form";

/// Alt text for the demo bubble.
pub const DEMO_ALT_TEXT: &str = "Demo card";

/// Bubble with a datetime picker that posts back `action=reserve`.
pub fn reservation_form() -> Value {
    json!({
        "type": "bubble",
        "body": {
            "type": "box",
            "layout": "vertical",
            "spacing": "md",
            "contents": [
                {"type": "text", "text": "Reservation", "weight": "bold", "size": "xl"},
                {"type": "text", "text": "Choose when you would like to visit.", "wrap": true}
            ]
        },
        "footer": {
            "type": "box",
            "layout": "vertical",
            "contents": [
                {
                    "type": "button",
                    "style": "primary",
                    "action": {
                        "type": "datetimepicker",
                        "label": "Pick a date and time",
                        "data": RESERVE_ACTION_DATA,
                        "mode": "datetime"
                    }
                }
            ]
        }
    })
}

/// Sample bubble showing header, hero image, body and footer.
pub fn demo_bubble() -> Value {
    json!({
        "type": "bubble",
        "hero": {
            "type": "image",
            "url": "https://scdn.line-apps.com/n/channel_devcenter/img/fx/01_1_cafe.png",
            "size": "full",
            "aspectRatio": "20:13",
            "aspectMode": "cover"
        },
        "body": {
            "type": "box",
            "layout": "vertical",
            "contents": [
                {"type": "text", "text": "Brown Cafe", "weight": "bold", "size": "xl"},
                {
                    "type": "box",
                    "layout": "baseline",
                    "margin": "md",
                    "contents": [
                        {"type": "text", "text": "4.0", "size": "sm", "color": "#999999"}
                    ]
                },
                {
                    "type": "text",
                    "text": "Miraina Tower, 4-1-6 Shinjuku, Tokyo",
                    "wrap": true,
                    "size": "sm",
                    "color": "#666666"
                }
            ]
        },
        "footer": {
            "type": "box",
            "layout": "vertical",
            "spacing": "sm",
            "contents": [
                {
                    "type": "button",
                    "style": "link",
                    "height": "sm",
                    "action": {"type": "uri", "label": "Website", "uri": "https://line.me/"}
                }
            ]
        }
    })
}
