use fake::Fake;
use fake::faker::address::en::{
    BuildingNumber, CityName, CountryName, Latitude, Longitude, StreetName, ZipCode,
};
use fake::faker::color::en::HexColor;
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::{DomainSuffix, FreeEmailProvider, Password};
use fake::faker::name::en::{FirstName, LastName, Name, Title};
use fake::faker::phone_number::en::PhoneNumber;
use rand::{Rng, RngCore};

use mockweave_core::StringGenerator;

const DEFAULT_PASSWORD_LENGTH: usize = 12;

/// Providers that need no reference resolution. Returns `None` for the
/// generators the evaluator handles itself (`email`, `username`, `format`).
pub fn generate_simple(generator: &StringGenerator, rng: &mut dyn RngCore) -> Option<String> {
    let value = match generator {
        StringGenerator::Uuid => uuid(rng),
        StringGenerator::Address => address(rng),
        StringGenerator::FirstName => FirstName().fake_with_rng(rng),
        StringGenerator::LastName => LastName().fake_with_rng(rng),
        StringGenerator::FullName => Name().fake_with_rng(rng),
        StringGenerator::CompanyName => CompanyName().fake_with_rng(rng),
        StringGenerator::Website => website(rng),
        StringGenerator::PhoneNumber => PhoneNumber().fake_with_rng(rng),
        StringGenerator::Country => CountryName().fake_with_rng(rng),
        StringGenerator::City => CityName().fake_with_rng(rng),
        StringGenerator::ZipCode => ZipCode().fake_with_rng(rng),
        StringGenerator::Latitude => Latitude().fake_with_rng(rng),
        StringGenerator::Longitude => Longitude().fake_with_rng(rng),
        StringGenerator::Color => HexColor().fake_with_rng(rng),
        StringGenerator::Title => Title().fake_with_rng(rng),
        StringGenerator::Password(password) => {
            let length = password
                .length
                .map(|value| value as usize)
                .unwrap_or(DEFAULT_PASSWORD_LENGTH);
            Password(length..length + 1).fake_with_rng(rng)
        }
        StringGenerator::Email(_) | StringGenerator::Username(_) | StringGenerator::Format(_) => {
            return None;
        }
    };
    Some(value)
}

/// Random v4 UUID drawn from the run's random source.
pub fn uuid(rng: &mut dyn RngCore) -> String {
    let mut bytes = [0_u8; 16];
    rng.fill_bytes(&mut bytes);
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    uuid::Uuid::from_bytes(bytes).to_string()
}

/// `street number, zip city, country`.
pub fn address(rng: &mut dyn RngCore) -> String {
    let street: String = StreetName().fake_with_rng(rng);
    let number: String = BuildingNumber().fake_with_rng(rng);
    let zip: String = ZipCode().fake_with_rng(rng);
    let city: String = CityName().fake_with_rng(rng);
    let country: String = CountryName().fake_with_rng(rng);
    format!("{street} {number}, {zip} {city}, {country}")
}

pub fn website(rng: &mut dyn RngCore) -> String {
    let company: String = CompanyName().fake_with_rng(rng);
    let suffix: String = DomainSuffix().fake_with_rng(rng);
    let label = slugify(&company);
    if label.is_empty() {
        format!("example.{suffix}")
    } else {
        format!("{label}.{suffix}")
    }
}

/// Email from optional name parts and domain; missing parts are drawn.
pub fn email(
    first_name: Option<&str>,
    last_name: Option<&str>,
    domain: Option<&str>,
    rng: &mut dyn RngCore,
) -> String {
    let local = username(first_name, last_name, rng);
    let domain = match domain {
        Some(domain) if !domain.is_empty() => domain.to_string(),
        _ => FreeEmailProvider().fake_with_rng(rng),
    };
    format!("{local}@{domain}")
}

/// Username from optional name parts; missing parts are drawn.
pub fn username(first_name: Option<&str>, last_name: Option<&str>, rng: &mut dyn RngCore) -> String {
    let first = match first_name {
        Some(value) => slugify(value),
        None => slugify(&FirstName().fake_with_rng::<String, _>(rng)),
    };
    let last = match last_name {
        Some(value) => slugify(value),
        None => slugify(&LastName().fake_with_rng::<String, _>(rng)),
    };

    let separator = ["", ".", "_"][rng.random_range(0..3)];
    let mut out = format!("{first}{separator}{last}");
    if rng.random_bool(0.5) {
        out.push_str(&rng.random_range(1..100).to_string());
    }
    out
}

fn slugify(value: &str) -> String {
    value
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .flat_map(|ch| ch.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockweave_core::PasswordGenerator;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn uuid_is_version_four() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let value = uuid(&mut rng);
        let parsed = uuid::Uuid::parse_str(&value).expect("valid uuid");
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn email_uses_given_parts() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let value = email(Some("Ana Maria"), Some("Silva"), Some("example.org"), &mut rng);
        assert!(value.starts_with("anamaria"));
        assert!(value.contains("silva"));
        assert!(value.ends_with("@example.org"));
    }

    #[test]
    fn password_respects_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let generator = StringGenerator::Password(PasswordGenerator { length: Some(20) });
        let value = generate_simple(&generator, &mut rng).expect("password");
        assert_eq!(value.chars().count(), 20);
    }

    #[test]
    fn named_providers_produce_text() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for generator in [
            StringGenerator::FirstName,
            StringGenerator::FullName,
            StringGenerator::Address,
            StringGenerator::Website,
            StringGenerator::Color,
            StringGenerator::Latitude,
        ] {
            let value = generate_simple(&generator, &mut rng).expect("value");
            assert!(!value.is_empty(), "{} produced empty text", generator.kind());
        }
    }
}
