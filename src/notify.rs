//! Outbound confirmation data. The shop coordinates over WhatsApp: after a
//! booking lands, the client is handed a prefilled `wa.me` deep link for the
//! barber's number. This module only builds the data; opening the link is
//! the client's job.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::{Appointment, Barber};

const DAYS_TR: [&str; 7] = ["Paz", "Pzt", "Sal", "Çar", "Per", "Cum", "Cmt"];
const MONTHS_TR: [&str; 12] = [
    "Oca", "Şub", "Mar", "Nis", "May", "Haz", "Tem", "Ağu", "Eyl", "Eki", "Kas", "Ara",
];

#[derive(Debug, Clone)]
pub struct WhatsappConfig {
    /// Shop number in E.164 without the leading `+`, used when the barber
    /// has no number of their own.
    pub default_number: String,
}

impl Default for WhatsappConfig {
    fn default() -> Self {
        Self {
            default_number: "905335494014".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WhatsappPayload {
    pub number: String,
    pub message: String,
    pub link: String,
}

/// `Sal, 20 Oca 2026` — the short Turkish form the booking screens use.
pub fn format_date_tr(date: NaiveDate) -> String {
    let day = DAYS_TR[date.weekday().num_days_from_sunday() as usize];
    let month = MONTHS_TR[date.month0() as usize];
    format!("{day}, {} {month} {}", date.day(), date.year())
}

fn booking_message(appointment: &Appointment) -> String {
    format!(
        "Merhaba {barber},\n\n\
         Randevu talebi:\n\
         📅 Tarih: {date}\n\
         ⏰ Saat: {time}\n\
         ✂️ Hizmet: {service} ({price} TL)\n\
         👤 Müşteri: {customer}\n\n\
         Randevunuzu onaylayabilir misiniz?",
        barber = appointment.barber_name,
        date = format_date_tr(appointment.date),
        time = appointment.time.format("%H:%M"),
        service = appointment.service_name,
        price = appointment.service_price,
        customer = appointment.customer_name,
    )
}

pub fn booking_payload(
    config: &WhatsappConfig,
    barber: Option<&Barber>,
    appointment: &Appointment,
) -> WhatsappPayload {
    let number = barber
        .and_then(|b| b.whatsapp_number.clone())
        .unwrap_or_else(|| config.default_number.clone());
    let message = booking_message(appointment);
    let link = format!("https://wa.me/{number}?text={}", urlencoding::encode(&message));
    WhatsappPayload {
        number,
        message,
        link,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};

    use crate::models::AppointmentStatus;

    fn appointment() -> Appointment {
        let now = Utc::now();
        Appointment {
            id: "a1".into(),
            customer_id: Some("c1".into()),
            customer_name: "Ahmet Yılmaz".into(),
            customer_phone: "0555 123 4567".into(),
            barber_id: "tarik".into(),
            barber_name: "Tarık Bey".into(),
            service_id: "1".into(),
            service_name: "Saç Kesimi".into(),
            service_price: 150,
            service_duration: 30,
            date: NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            start_min: 600,
            end_min: 630,
            status: AppointmentStatus::Pending,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn turkish_date_format() {
        // 2026-01-20 is a Tuesday.
        let date = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        assert_eq!(format_date_tr(date), "Sal, 20 Oca 2026");
    }

    #[test]
    fn message_carries_the_booking_summary() {
        let message = booking_message(&appointment());
        assert!(message.contains("Merhaba Tarık Bey"));
        assert!(message.contains("Sal, 20 Oca 2026"));
        assert!(message.contains("10:00"));
        assert!(message.contains("Saç Kesimi (150 TL)"));
        assert!(message.contains("Ahmet Yılmaz"));
    }

    #[test]
    fn payload_prefers_the_barbers_own_number() {
        let config = WhatsappConfig::default();
        let barber = Barber {
            id: "tarik".into(),
            name: "Tarık Bey".into(),
            is_owner: true,
            whatsapp_number: Some("905551112233".into()),
        };

        let payload = booking_payload(&config, Some(&barber), &appointment());
        assert_eq!(payload.number, "905551112233");
        assert!(payload.link.starts_with("https://wa.me/905551112233?text="));
        // The deep link never carries raw spaces or newlines.
        assert!(!payload.link.contains(' '));
        assert!(!payload.link.contains('\n'));

        let fallback = booking_payload(&config, None, &appointment());
        assert_eq!(fallback.number, "905335494014");
    }
}
