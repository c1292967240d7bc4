use console_core::Page;
use shared::domain::Appointment;

const HEADERS: [&str; 7] = ["id", "date", "time", "type", "patient", "doctor", "status"];

fn row(appointment: &Appointment) -> [String; 7] {
    let [date, time, kind, patient, doctor, status] = appointment.display_columns();
    [
        appointment.appointment_id.to_string(),
        date,
        time,
        kind,
        patient,
        doctor,
        status,
    ]
}

/// Plain-text table with a footer describing the page position.
pub fn render_page(page: &Page, filter: Option<&str>) -> String {
    let rows: Vec<[String; 7]> = page.items.iter().map(row).collect();

    let mut widths = HEADERS.map(str::len);
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(rule.join("-+-").as_str());
    out.push('\n');
    for cells in &rows {
        push_line(&mut out, cells, &widths);
    }

    if page.items.is_empty() {
        out.push_str("(no appointments)\n");
    }
    out.push_str(&format!(
        "page {} of {} ({} appointments",
        page.index + 1,
        page.page_count().max(1),
        page.total
    ));
    if let Some(filter) = filter {
        out.push_str(&format!(", filter \"{filter}\""));
    }
    out.push_str(")\n");
    out
}

fn push_line(out: &mut String, cells: &[String; 7], widths: &[usize; 7]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

pub fn render_details(appointment: &Appointment) -> String {
    let [date, time, kind, patient, doctor, status] = appointment.display_columns();
    format!(
        "appointment {}\n  date:    {date} {time}\n  type:    {kind}\n  patient: {patient}\n  doctor:  {doctor}\n  status:  {status} (code {})\n",
        appointment.appointment_id,
        appointment.status.code()
    )
}
