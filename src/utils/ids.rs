//! Generación de identificadores legibles
//!
//! Números de carga con formato `LD-<timestamp>-<sufijo>` para mostrar
//! en la UI de dispatch. El identificador real de la entidad sigue
//! siendo un UUID opaco.

use chrono::Utc;
use rand::Rng;

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generar un número de carga legible, único en la práctica
pub fn generate_load_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("LD-{}-{}", to_base36(millis), suffix)
}

/// Verificar que un string tiene el formato de número de carga
pub fn is_valid_load_number(value: &str) -> bool {
    let mut parts = value.split('-');
    let prefix = parts.next();
    let stamp = parts.next();
    let suffix = parts.next();

    if parts.next().is_some() {
        return false;
    }

    matches!((prefix, stamp, suffix), (Some("LD"), Some(s), Some(x))
        if !s.is_empty()
            && !x.is_empty()
            && s.bytes().all(|b| ALPHABET.contains(&b))
            && x.bytes().all(|b| ALPHABET.contains(&b)))
}

fn to_base36(mut value: i64) -> String {
    if value <= 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
