//! City/locale extraction.
//!
//! Pure, deterministic resolution of a locality name for a record: prefer
//! structured city fields, then scan the record's free text against a fixed,
//! ordered gazetteer of known localities, then fall back to the country
//! label. No store access; fully unit-testable in isolation.

use crate::input::{Entry, non_empty};

/// Known localities, scanned in order; the first substring match wins.
pub const GAZETTEER: [&str; 20] = [
    "القاهرة",
    "الإسكندرية",
    "الجيزة",
    "طنطا",
    "دمنهور",
    "كفر الشيخ",
    "المنصورة",
    "الزقازيق",
    "بورسعيد",
    "الإسماعيلية",
    "أسيوط",
    "سوهاج",
    "قنا",
    "الأقصر",
    "أسوان",
    "دمياط",
    "الفيوم",
    "بني سويف",
    "المنيا",
    "شبين الكوم",
];

/// Country-level fallback when no locality can be determined.
pub const COUNTRY_FALLBACK: &str = "مصر";

/// Resolve the city for a record.
///
/// Preference order: structured `shop.city`, structured `service.city`, a
/// gazetteer scan of the concatenated description, embedding text and Arabic
/// address, then [`COUNTRY_FALLBACK`].
#[must_use]
pub fn extract_city(entry: &Entry) -> String {
    if let Some(city) = non_empty(entry.shop.city.as_deref()) {
        return city.to_owned();
    }
    if let Some(city) = non_empty(entry.service.city.as_deref()) {
        return city.to_owned();
    }

    let haystack = format!(
        "{} {} {}",
        entry.service.description_ar.as_deref().unwrap_or_default(),
        entry.service.embedding_text.as_deref().unwrap_or_default(),
        entry.shop.address_ar.as_deref().unwrap_or_default(),
    )
    .to_lowercase();

    GAZETTEER
        .iter()
        .find(|city| haystack.contains(**city))
        .map_or_else(|| COUNTRY_FALLBACK.to_owned(), |city| (*city).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ServiceInput, ShopInput, UserInput};

    fn entry(shop_city: Option<&str>, service_city: Option<&str>, desc_ar: Option<&str>) -> Entry {
        Entry {
            user: UserInput {
                name: "X".to_owned(),
                phone: None,
                email: None,
                role: None,
            },
            shop: ShopInput {
                name: "S".to_owned(),
                phone: None,
                email: None,
                city: shop_city.map(ToOwned::to_owned),
                address_ar: None,
                address_en: None,
                tags: Vec::new(),
            },
            service: ServiceInput {
                name_ar: None,
                name_en: None,
                description_ar: desc_ar.map(ToOwned::to_owned),
                description_en: None,
                embedding_text: None,
                city: service_city.map(ToOwned::to_owned),
                category_id: None,
                sub_category_id: None,
                tags: Vec::new(),
            },
            reviews: Vec::new(),
        }
    }

    #[test]
    fn test_structured_shop_city_wins() {
        let e = entry(Some("طنطا"), Some("قنا"), Some("عيادة في القاهرة"));
        assert_eq!(extract_city(&e), "طنطا");
    }

    #[test]
    fn test_structured_service_city_is_second() {
        let e = entry(None, Some("قنا"), Some("عيادة في القاهرة"));
        assert_eq!(extract_city(&e), "قنا");
    }

    #[test]
    fn test_gazetteer_scan_on_description() {
        let e = entry(None, None, Some("أفضل عيادة جلدية في المنصورة"));
        assert_eq!(extract_city(&e), "المنصورة");
    }

    #[test]
    fn test_gazetteer_first_match_wins_in_list_order() {
        // Both القاهرة and أسوان appear; القاهرة precedes it in the gazetteer.
        let e = entry(None, None, Some("فروع في أسوان و القاهرة"));
        assert_eq!(extract_city(&e), "القاهرة");
    }

    #[test]
    fn test_country_fallback() {
        let e = entry(None, None, Some("no locality mentioned"));
        assert_eq!(extract_city(&e), COUNTRY_FALLBACK);
    }

    #[test]
    fn test_blank_structured_city_is_ignored() {
        let e = entry(Some("  "), None, None);
        assert_eq!(extract_city(&e), COUNTRY_FALLBACK);
    }
}
