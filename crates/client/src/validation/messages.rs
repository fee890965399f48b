//! User-facing validation messages.

pub fn empty(name: &str) -> String {
    format!("{name} không được để trống")
}

pub fn email(name: &str) -> String {
    format!("{name} sai định dạng email")
}

pub fn phone_number(name: &str) -> String {
    format!("{name} sai định dạng số điện thoại")
}

pub fn password(name: &str) -> String {
    format!("{name} cần từ 8 đến 32 ký tự bao gồm chữ, số, chữ in hoa")
}
